//! SKU-keyed diff between the filtered local feed and the remote snapshot.
//!
//! Remote items absent from the local list are left untouched; deletion is
//! deliberately not part of the reconciliation (an incomplete feed must
//! never wipe the shop).

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use shopsync_core::{LocalProduct, RemoteProduct, Sku, UpdatePlan};

/// Ephemeral reconciliation plan; recomputed every run, never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diff {
    /// Present locally, absent remotely.
    pub to_create: Vec<LocalProduct>,
    /// Present on both sides but differing in price, quantity or
    /// publication membership.
    pub to_update: Vec<(RemoteProduct, UpdatePlan)>,
    /// Present on both sides and already in sync.
    pub unchanged: usize,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty()
    }
}

/// Compute the minimal operation set for one run.
///
/// Local items outside `allowed` never produce an entry. Duplicate local
/// SKUs keep the first occurrence only, so a SKU can never have two applies
/// queued within one run.
pub fn compute_diff(
    local: &[LocalProduct],
    remote: &HashMap<Sku, RemoteProduct>,
    allowed: &BTreeSet<String>,
    publication_id: &str,
) -> Diff {
    let mut diff = Diff::default();
    let mut seen: HashSet<Sku> = HashSet::new();

    for product in local {
        if !allowed.contains(&product.subfamily) {
            tracing::debug!(
                "ignoring {}: sub-family '{}' not in allow-list",
                product.sku,
                product.subfamily
            );
            continue;
        }
        if !seen.insert(product.sku.clone()) {
            tracing::warn!("duplicate SKU {} in feed; keeping first occurrence", product.sku);
            continue;
        }

        match remote.get(&product.sku) {
            None => diff.to_create.push(product.clone()),
            Some(existing) => {
                let plan = plan_update(existing, product, publication_id);
                if plan.is_empty() {
                    diff.unchanged += 1;
                } else {
                    diff.to_update.push((existing.clone(), plan));
                }
            }
        }
    }

    tracing::info!(
        "diff: {} to create, {} to update, {} unchanged",
        diff.to_create.len(),
        diff.to_update.len(),
        diff.unchanged
    );
    diff
}

/// Minimal mutation set for one already-existing product.
fn plan_update(remote: &RemoteProduct, local: &LocalProduct, publication_id: &str) -> UpdatePlan {
    UpdatePlan {
        price: (remote.price != local.price).then_some(local.price),
        quantity: (remote.quantity != local.stock).then_some(local.stock),
        publish: !remote.publications.contains(publication_id),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
