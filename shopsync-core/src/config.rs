//! Run configuration, built once at startup from environment variables.
//!
//! Every component receives the resulting [`SyncConfig`] by reference; no
//! component reads ambient environment state directly.

use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigProblem};

/// Admin API version pinned for every GraphQL call.
pub const API_VERSION: &str = "2024-10";

/// Feed host used when `FEED_URL` is not set.
pub const DEFAULT_FEED_URL: &str = "https://fastapi-megasur.onrender.com";

/// Required environment variables, validated together.
pub const REQUIRED_VARS: [&str; 5] = [
    "SHOP_URL",
    "SHOP_TOKEN",
    "LOCATION_ID",
    "SUBFAMILIAS",
    "PUBLICATION_ID",
];

// ---------------------------------------------------------------------------
// AccessToken
// ---------------------------------------------------------------------------

/// Admin API access token. `Debug` output is redacted; the raw value is
/// only reachable through [`AccessToken::expose`] and must never be logged.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(****)")
    }
}

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

/// Immutable configuration for one reconciliation run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Bare shop host, e.g. `my-shop.myshopify.com` (no scheme).
    pub shop_url: String,
    pub token: AccessToken,
    /// Inventory location id (`gid://shopify/Location/...`).
    pub location_id: String,
    /// Sub-family labels allowed to participate in the sync.
    pub subfamilies: Vec<String>,
    /// Sales-channel publication id products are published to.
    pub publication_id: String,
    /// Base URL of the local feed service.
    pub feed_url: String,
    /// Optional PEM trust bundle for environments with custom CAs.
    pub ca_bundle: Option<PathBuf>,
}

impl SyncConfig {
    /// Read and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Read configuration through an injectable lookup.
    ///
    /// Collects every missing/malformed field before failing; performs no
    /// network or disk I/O.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut problems = Vec::new();

        let mut required = |var: &'static str| -> Option<String> {
            match lookup(var).map(|v| v.trim().to_owned()) {
                Some(v) if !v.is_empty() => Some(v),
                Some(_) => {
                    problems.push(ConfigProblem {
                        var,
                        reason: "set but empty".into(),
                    });
                    None
                }
                None => {
                    problems.push(ConfigProblem {
                        var,
                        reason: "not set".into(),
                    });
                    None
                }
            }
        };

        let shop_url = required("SHOP_URL").map(|u| u.trim_end_matches('/').to_owned());
        let token = required("SHOP_TOKEN");
        let location_id = required("LOCATION_ID");
        let raw_subfamilies = required("SUBFAMILIAS");
        let publication_id = required("PUBLICATION_ID");

        if let Some(url) = &shop_url {
            if url.is_empty() {
                problems.push(ConfigProblem {
                    var: "SHOP_URL",
                    reason: "set but empty".into(),
                });
            } else if url.contains("://") {
                problems.push(ConfigProblem {
                    var: "SHOP_URL",
                    reason: "must be a bare host, without scheme".into(),
                });
            }
        }

        let subfamilies: Vec<String> = raw_subfamilies
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        if raw_subfamilies.is_some() && subfamilies.is_empty() {
            problems.push(ConfigProblem {
                var: "SUBFAMILIAS",
                reason: "no sub-family labels after splitting on ','".into(),
            });
        }

        let feed_url = lookup("FEED_URL")
            .map(|v| v.trim().trim_end_matches('/').to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_FEED_URL.to_owned());

        let ca_bundle = lookup("SHOP_CA_BUNDLE")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        if !problems.is_empty() {
            return Err(ConfigError { problems });
        }

        // All unwraps guarded by the empty-problems check above.
        Ok(Self {
            shop_url: shop_url.unwrap(),
            token: AccessToken::new(token.unwrap()),
            location_id: location_id.unwrap(),
            subfamilies,
            publication_id: publication_id.unwrap(),
            feed_url,
            ca_bundle,
        })
    }

    /// Admin GraphQL endpoint for this shop.
    pub fn graphql_endpoint(&self) -> String {
        format!(
            "https://{}/admin/api/{}/graphql.json",
            self.shop_url, API_VERSION
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
