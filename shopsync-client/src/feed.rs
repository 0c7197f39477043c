//! Local feed client: the wholesale catalog service this job treats as the
//! source of truth.
//!
//! The feed is queried once per allowed sub-family; numeric fields arrive
//! as Spanish-locale decimal strings (sometimes as bare numbers) and the
//! retail price is derived here.

use serde::Deserialize;

use shopsync_core::{parse_decimal_es, LocalProduct, Price, Sku, SyncConfig};

use crate::error::ClientError;
use crate::http::{build_client, send_with_retry, RetryPolicy};

/// Source of the local product list. Production uses [`FeedClient`]; tests
/// substitute a canned list.
pub trait LocalFeed {
    /// Fetch every product belonging to the given sub-families.
    fn fetch(&self, subfamilies: &[String]) -> Result<Vec<LocalProduct>, ClientError>;
}

/// HTTP feed client with the same retry policy as the platform transport.
pub struct FeedClient {
    client: reqwest::blocking::Client,
    base_url: String,
    policy: RetryPolicy,
}

impl FeedClient {
    pub fn from_config(config: &SyncConfig, policy: RetryPolicy) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_client(config, policy.timeout)?,
            base_url: config.feed_url.clone(),
            policy,
        })
    }

    fn fetch_subfamily(&self, subfamily: &str) -> Result<Vec<FeedRecord>, ClientError> {
        let url = format!("{}/catalogo", self.base_url);
        let resp = send_with_retry(&self.policy, "feed", || {
            self.client
                .get(&url)
                .query(&[("subfamilia", subfamily)])
                .send()
        })?;
        resp.json().map_err(|e| ClientError::transport(&e))
    }
}

impl LocalFeed for FeedClient {
    fn fetch(&self, subfamilies: &[String]) -> Result<Vec<LocalProduct>, ClientError> {
        let mut products = Vec::new();
        for subfamily in subfamilies {
            let records = self.fetch_subfamily(subfamily)?;
            tracing::debug!("feed returned {} records for '{subfamily}'", records.len());
            for record in records {
                match record.into_product(subfamily) {
                    Some(product) => products.push(product),
                    None => tracing::warn!("skipping feed record without REF in '{subfamily}'"),
                }
            }
        }
        tracing::info!("fetched {} local products", products.len());
        Ok(products)
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// One field of a feed record. The feed is loose about types: the same
/// column can arrive as a string, a bare number, or null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
enum FeedField {
    Text(String),
    Number(f64),
    #[default]
    Empty,
}

impl FeedField {
    fn text(&self) -> String {
        match self {
            FeedField::Text(s) => s.trim().to_owned(),
            FeedField::Number(n) => n.to_string(),
            FeedField::Empty => String::new(),
        }
    }

    /// Spanish-locale decimal field, defaulting to zero.
    fn decimal(&self) -> f64 {
        match self {
            FeedField::Number(n) => *n,
            other => parse_decimal_es(&other.text()).unwrap_or(0.0),
        }
    }

    /// Stock arrives as a plain (dot-decimal) number or numeric string.
    fn whole(&self) -> i64 {
        match self {
            FeedField::Number(n) => *n as i64,
            FeedField::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0) as i64,
            FeedField::Empty => 0,
        }
    }
}

/// One feed record as served by `/catalogo`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FeedRecord {
    #[serde(rename = "REF", default)]
    sku: FeedField,
    #[serde(rename = "EAN", default)]
    ean: FeedField,
    #[serde(rename = "NAME", default)]
    name: FeedField,
    #[serde(rename = "SUBFAMILIA", default)]
    subfamily: FeedField,
    #[serde(rename = "PVD", default)]
    pvd: FeedField,
    #[serde(rename = "CANON", default)]
    canon: FeedField,
    #[serde(rename = "MARGIN", default)]
    margin: FeedField,
    #[serde(rename = "STOCK", default)]
    stock: FeedField,
    #[serde(rename = "DESCRIPTION", default)]
    description: FeedField,
    #[serde(rename = "URL_IMG", default)]
    image_url: FeedField,
}

impl FeedRecord {
    /// Convert into a domain product; `None` when the record has no usable
    /// SKU.
    fn into_product(self, requested_subfamily: &str) -> Option<LocalProduct> {
        let sku = self.sku.text();
        if sku.is_empty() {
            return None;
        }

        let subfamily = match self.subfamily.text() {
            s if s.is_empty() => requested_subfamily.to_owned(),
            s => s,
        };

        Some(LocalProduct {
            sku: Sku::from(sku),
            ean: self.ean.text(),
            title: self.name.text(),
            description: self.description.text(),
            subfamily,
            price: Price::derive_retail(self.pvd.decimal(), self.canon.decimal(), self.margin.decimal()),
            stock: self.stock.whole(),
            image_url: match self.image_url.text() {
                s if s.is_empty() => None,
                s => Some(s),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: serde_json::Value) -> FeedRecord {
        serde_json::from_value(value).expect("feed record")
    }

    fn sample() -> serde_json::Value {
        json!({
            "EAN": "8412345678901",
            "REF": "REF-1",
            "NAME": "Cable HDMI 2m",
            "SUBFAMILIA": "CABLES",
            "PVD": "10,31",
            "CANON": "0",
            "MARGIN": "0",
            "STOCK": "4.0",
            "DESCRIPTION": "<p>2m</p>",
            "URL_IMG": "https://img.test/1.jpg"
        })
    }

    #[test]
    fn record_converts_with_derived_price() {
        let p = record(sample()).into_product("CABLES").expect("product");
        assert_eq!(p.sku, Sku::from("REF-1"));
        assert_eq!(p.ean, "8412345678901");
        // 10.31 * 1.21 = 12.4751 -> truncated to 12.47.
        assert_eq!(p.price, Price::from_cents(1247));
        assert_eq!(p.stock, 4);
        assert_eq!(p.subfamily, "CABLES");
        assert_eq!(p.image_url.as_deref(), Some("https://img.test/1.jpg"));
    }

    #[test]
    fn record_without_ref_is_skipped() {
        let mut v = sample();
        v["REF"] = json!("");
        assert!(record(v.clone()).into_product("CABLES").is_none());
        v.as_object_mut().unwrap().remove("REF");
        assert!(record(v).into_product("CABLES").is_none());
    }

    #[test]
    fn numeric_and_null_fields_deserialize() {
        let mut v = sample();
        v["EAN"] = json!(8412345678901u64);
        v["STOCK"] = json!(7.0);
        v["URL_IMG"] = json!(null);
        let p = record(v).into_product("CABLES").expect("product");
        assert_eq!(p.ean, "8412345678901");
        assert_eq!(p.stock, 7);
        assert!(p.image_url.is_none());
    }

    #[test]
    fn missing_optional_fields_default() {
        let p = record(json!({ "REF": "REF-2" }))
            .into_product("RATONES")
            .expect("product");
        assert_eq!(p.price, Price::from_cents(0));
        assert_eq!(p.stock, 0);
        assert_eq!(p.subfamily, "RATONES", "falls back to the requested sub-family");
        assert!(p.image_url.is_none());
    }

    #[test]
    fn thousands_separators_in_feed_figures() {
        let mut v = sample();
        v["PVD"] = json!("1.033,06");
        let p = record(v).into_product("CABLES").expect("product");
        // 1033.06 * 1.21 = 1250.0026 -> 1250.00.
        assert_eq!(p.price, Price::from_cents(125000));
    }

    #[test]
    fn unknown_feed_columns_are_ignored() {
        let mut v = sample();
        v["FAMILIA"] = json!("INFORMATICA");
        assert!(record(v).into_product("CABLES").is_some());
    }
}
