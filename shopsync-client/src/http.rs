//! Retrying HTTP transport for the Admin GraphQL API.
//!
//! Transient failures (5xx, timeouts, connection errors) are retried with
//! doubling backoff up to [`RetryPolicy::max_attempts`]. Rate-limit
//! responses (429) are waited out per `Retry-After` without consuming a
//! retry attempt, bounded by [`RetryPolicy::max_rate_limit_wait`] in total.

use std::fs;
use std::time::Duration;

use serde_json::{json, Value};

use shopsync_core::SyncConfig;

use crate::error::ClientError;

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Bounds for the retry/backoff loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum request attempts per call (first try included).
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles on each subsequent one.
    pub initial_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
    /// Total time budget for honoring rate-limit waits within one call.
    pub max_rate_limit_wait: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            max_rate_limit_wait: Duration::from_secs(120),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based), doubling and capped.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        let raw = self.initial_backoff.saturating_mul(1u32 << exp);
        raw.min(self.max_backoff)
    }
}

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

/// What to do with one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Disposition {
    Success,
    /// Server-side or connection-level trouble; retry with backoff.
    Transient,
    /// Throttled; wait the given duration and retry without spending an
    /// attempt.
    RateLimited(Duration),
    /// Client error; retrying cannot help.
    Fatal,
}

pub(crate) fn classify_status(status: u16, retry_after: Option<&str>) -> Disposition {
    match status {
        200..=299 => Disposition::Success,
        429 => {
            let wait = retry_after
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map(Duration::from_secs_f64)
                .unwrap_or(Duration::from_secs(2));
            Disposition::RateLimited(wait)
        }
        500..=599 => Disposition::Transient,
        _ => Disposition::Fatal,
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Seam between the Shopify client and the wire. Tests provide canned
/// responses; production uses [`HttpTransport`].
pub trait GraphqlTransport {
    /// Execute one GraphQL document and return the `data` object.
    fn execute(&self, query: &str, variables: Value) -> Result<Value, ClientError>;
}

/// Build a blocking HTTP client honoring the optional CA bundle.
pub(crate) fn build_client(
    config: &SyncConfig,
    timeout: Duration,
) -> Result<reqwest::blocking::Client, ClientError> {
    let mut builder = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("shopsync/", env!("CARGO_PKG_VERSION")));

    if let Some(path) = &config.ca_bundle {
        let pem = fs::read(path).map_err(|e| ClientError::CaBundle {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| ClientError::CaBundle {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        builder = builder.add_root_certificate(cert);
    }

    builder.build().map_err(|e| ClientError::Transport {
        reason: e.to_string(),
    })
}

/// Production transport: POSTs to the shop's Admin GraphQL endpoint with
/// the access-token header, applying the retry policy.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: shopsync_core::AccessToken,
    policy: RetryPolicy,
}

impl HttpTransport {
    pub fn from_config(config: &SyncConfig, policy: RetryPolicy) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_client(config, policy.timeout)?,
            endpoint: config.graphql_endpoint(),
            token: config.token.clone(),
            policy,
        })
    }
}

impl GraphqlTransport for HttpTransport {
    fn execute(&self, query: &str, variables: Value) -> Result<Value, ClientError> {
        let payload = json!({ "query": query, "variables": variables });
        let resp = send_with_retry(&self.policy, "graphql", || {
            self.client
                .post(&self.endpoint)
                .header("X-Shopify-Access-Token", self.token.expose())
                .header("Content-Type", "application/json")
                .json(&payload)
                .send()
        })?;
        let body: Value = resp.json().map_err(|e| ClientError::transport(&e))?;
        extract_data(body)
    }
}

/// Run one logical HTTP call under the retry policy.
///
/// `send` issues a fresh request per attempt. Returns the first successful
/// response; transient failures consume attempts, rate-limit waits only
/// consume the wait budget.
pub(crate) fn send_with_retry<F>(
    policy: &RetryPolicy,
    what: &str,
    send: F,
) -> Result<reqwest::blocking::Response, ClientError>
where
    F: Fn() -> Result<reqwest::blocking::Response, reqwest::Error>,
{
    let mut attempt = 0u32;
    let mut rate_limit_waited = Duration::ZERO;
    let mut last = String::new();

    while attempt < policy.max_attempts {
        if attempt > 0 {
            let backoff = policy.backoff_for(attempt);
            tracing::debug!(
                "{what}: retry {}/{} after {:?}",
                attempt + 1,
                policy.max_attempts,
                backoff
            );
            std::thread::sleep(backoff);
        }

        match send() {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let retry_after = resp
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                match classify_status(status, retry_after.as_deref()) {
                    Disposition::Success => return Ok(resp),
                    Disposition::RateLimited(wait) => {
                        if rate_limit_waited + wait > policy.max_rate_limit_wait {
                            last = format!("rate-limit wait budget exhausted (next wait {wait:?})");
                            attempt += 1;
                        } else {
                            tracing::warn!("{what}: rate limited; waiting {:?}", wait);
                            rate_limit_waited += wait;
                            std::thread::sleep(wait);
                        }
                    }
                    Disposition::Transient => {
                        last = format!("HTTP {status}");
                        attempt += 1;
                    }
                    Disposition::Fatal => {
                        return Err(ClientError::Status {
                            status,
                            body: resp.text().unwrap_or_default(),
                        });
                    }
                }
            }
            Err(e) => {
                last = e.to_string();
                attempt += 1;
            }
        }
    }

    Err(ClientError::RetriesExhausted {
        attempts: policy.max_attempts,
        last,
    })
}

/// Surface top-level GraphQL `errors` and unwrap `data`.
pub(crate) fn extract_data(body: Value) -> Result<Value, ClientError> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let message = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_owned()
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ClientError::Api { message });
        }
    }
    match body.get("data") {
        Some(data) if !data.is_null() => Ok(data.clone()),
        _ => Err(ClientError::decode("response has no data object")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(200, Disposition::Success)]
    #[case(201, Disposition::Success)]
    #[case(500, Disposition::Transient)]
    #[case(503, Disposition::Transient)]
    #[case(404, Disposition::Fatal)]
    #[case(401, Disposition::Fatal)]
    fn status_classification(#[case] status: u16, #[case] expected: Disposition) {
        assert_eq!(classify_status(status, None), expected);
    }

    #[test]
    fn rate_limit_honors_retry_after() {
        assert_eq!(
            classify_status(429, Some("7")),
            Disposition::RateLimited(Duration::from_secs(7))
        );
        assert_eq!(
            classify_status(429, Some("2.0")),
            Disposition::RateLimited(Duration::from_secs(2))
        );
    }

    #[test]
    fn rate_limit_without_header_uses_default_wait() {
        assert_eq!(
            classify_status(429, None),
            Disposition::RateLimited(Duration::from_secs(2))
        );
        assert_eq!(
            classify_status(429, Some("soon")),
            Disposition::RateLimited(Duration::from_secs(2))
        );
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(10), Duration::from_secs(30));
        assert_eq!(policy.backoff_for(100), Duration::from_secs(30));
    }

    #[test]
    fn extract_data_unwraps_payload() {
        let data = extract_data(json!({ "data": { "ok": true } })).expect("data");
        assert_eq!(data, json!({ "ok": true }));
    }

    #[test]
    fn extract_data_surfaces_graphql_errors() {
        let err = extract_data(json!({
            "errors": [{ "message": "Throttled" }, { "message": "boom" }],
            "data": null
        }))
        .expect_err("must fail");
        assert!(matches!(err, ClientError::Api { ref message } if message.contains("Throttled")));
    }

    #[test]
    fn extract_data_rejects_missing_data() {
        let err = extract_data(json!({})).expect_err("must fail");
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    fn config_with_ca(path: Option<std::path::PathBuf>) -> SyncConfig {
        SyncConfig {
            shop_url: "demo.myshopify.com".into(),
            token: shopsync_core::AccessToken::new("shpat_test"),
            location_id: "gid://shopify/Location/1".into(),
            subfamilies: vec!["CABLES".into()],
            publication_id: "gid://shopify/Publication/1".into(),
            feed_url: "https://feed.test".into(),
            ca_bundle: path,
        }
    }

    #[test]
    fn missing_ca_bundle_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope.pem");
        let err = build_client(&config_with_ca(Some(path.clone())), Duration::from_secs(1))
            .expect_err("must fail");
        assert!(matches!(err, ClientError::CaBundle { path: p, .. } if p == path));
    }

    #[test]
    fn invalid_ca_bundle_content_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ca.pem");
        std::fs::write(&path, "not a pem").expect("write");
        let err = build_client(&config_with_ca(Some(path)), Duration::from_secs(1))
            .expect_err("must fail");
        assert!(matches!(err, ClientError::CaBundle { .. }));
    }

    #[test]
    fn client_builds_without_ca_bundle() {
        build_client(&config_with_ca(None), Duration::from_secs(1)).expect("client");
    }
}
