//! Domain types for the shopsync catalog.
//!
//! Prices are held in integer cents; never compare floating-point money.
//! All types are serializable/deserializable via serde.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// VAT percentage applied when deriving a retail price from the feed.
pub const IVA_PCT: f64 = 21.0;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stable product/variant identifier; the join key between local and remote
/// catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sku(pub String);

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Sku {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Sku {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// An opaque remote-platform identifier (`gid://shopify/...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteId(pub String);

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RemoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RemoteId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// A price in integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(i64);

impl Price {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Parse a dot-decimal amount as returned by the remote API ("12.40").
    pub fn parse_api(s: &str) -> Option<Self> {
        let value: f64 = s.trim().parse().ok()?;
        Some(Self((value * 100.0).round() as i64))
    }

    /// Derive the retail price from feed figures: distributor price plus
    /// canon, marked up by the margin percentage, plus VAT, truncated to
    /// whole cents.
    pub fn derive_retail(pvd: f64, canon: f64, margin_pct: f64) -> Self {
        let base = pvd + canon;
        let net = base * (1.0 + margin_pct / 100.0);
        let gross = net * (1.0 + IVA_PCT / 100.0);
        Self((gross * 100.0).floor() as i64)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, (self.0 % 100).abs())
    }
}

/// Parse a Spanish-locale decimal string ("1.234,56") into a float.
///
/// Thousands separators are dots, the decimal separator is a comma; the
/// feed emits every numeric field in this format.
pub fn parse_decimal_es(s: &str) -> Option<f64> {
    let normalized = s.trim().replace('.', "").replace(',', ".");
    if normalized.is_empty() {
        return Some(0.0);
    }
    normalized.parse().ok()
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A product from the local feed, already priced and scoped to an allowed
/// sub-family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalProduct {
    pub sku: Sku,
    pub ean: String,
    pub title: String,
    pub description: String,
    pub subfamily: String,
    pub price: Price,
    pub stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl LocalProduct {
    /// Product handle used on the remote platform, stable across runs.
    pub fn handle(&self) -> String {
        format!("ean-{}", self.ean)
    }
}

/// A product as it currently exists on the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProduct {
    pub id: RemoteId,
    pub variant_id: RemoteId,
    pub inventory_item_id: RemoteId,
    pub sku: Sku,
    pub price: Price,
    pub quantity: i64,
    /// Publication ids the product is currently visible on.
    #[serde(default)]
    pub publications: BTreeSet<String>,
}

/// The minimal set of mutations needed to bring one remote product in line
/// with its local counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdatePlan {
    pub price: Option<Price>,
    pub quantity: Option<i64>,
    pub publish: bool,
}

impl UpdatePlan {
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.quantity.is_none() && !self.publish
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
