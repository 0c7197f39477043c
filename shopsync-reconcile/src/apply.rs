//! Sequential apply phase with per-item failure isolation.
//!
//! A failing item is recorded and the loop moves on; the apply phase never
//! aborts the run. Ordering is strictly sequential, so at most one request
//! is in flight per SKU at any time.

use serde::Serialize;

use shopsync_client::{ClientError, ProductApi};
use shopsync_core::{LocalProduct, Sku};

use crate::diff::Diff;

/// One item that could not be created or updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyFailure {
    pub sku: Sku,
    pub reason: String,
}

/// Aggregated outcome of the apply phase.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub created: usize,
    pub updated: usize,
    pub failures: Vec<ApplyFailure>,
}

impl ApplyReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Execute every planned create and update, one item at a time.
pub fn apply(api: &impl ProductApi, diff: &Diff) -> ApplyReport {
    let mut report = ApplyReport::default();

    for product in &diff.to_create {
        match create_and_publish(api, product) {
            Ok(()) => {
                tracing::info!("created {}", product.sku);
                report.created += 1;
            }
            Err(err) => {
                tracing::warn!("create failed for {}: {err}", product.sku);
                report.failures.push(ApplyFailure {
                    sku: product.sku.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    for (remote, plan) in &diff.to_update {
        match api.update_product(remote, plan) {
            Ok(()) => {
                tracing::info!("updated {}", remote.sku);
                report.updated += 1;
            }
            Err(err) => {
                tracing::warn!("update failed for {}: {err}", remote.sku);
                report.failures.push(ApplyFailure {
                    sku: remote.sku.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    report
}

/// A created product is immediately published to the configured channel.
/// If publish fails the item counts as failed; the next run finds the
/// product remotely and re-plans only the publish.
fn create_and_publish(api: &impl ProductApi, product: &LocalProduct) -> Result<(), ClientError> {
    let id = api.create_product(product)?;
    api.publish_product(&id)
}
