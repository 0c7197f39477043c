//! Subcommand implementations.

pub mod diff;
pub mod run;

use shopsync_client::{FeedClient, HttpTransport, RetryPolicy, ShopifyClient};
use shopsync_core::UpdatePlan;
use shopsync_reconcile::{pipeline, RunError, RunReport};

/// Load config, wire up the clients and execute one pipeline run.
pub(crate) fn execute(dry_run: bool) -> Result<RunReport, RunError> {
    let config = pipeline::load_config()?;
    let transport =
        HttpTransport::from_config(&config, RetryPolicy::default()).map_err(RunError::Fetch)?;
    let api = ShopifyClient::new(
        transport,
        config.location_id.clone(),
        config.publication_id.clone(),
    );
    let feed = FeedClient::from_config(&config, RetryPolicy::default()).map_err(RunError::Feed)?;
    pipeline::run(&config, &feed, &api, dry_run)
}

/// One-line description of a planned update, e.g. `price -> 12.99, qty -> 4`.
pub(crate) fn describe_plan(plan: &UpdatePlan) -> String {
    let mut parts = Vec::new();
    if let Some(price) = plan.price {
        parts.push(format!("price -> {price}"));
    }
    if let Some(quantity) = plan.quantity {
        parts.push(format!("qty -> {quantity}"));
    }
    if plan.publish {
        parts.push("publish".to_owned());
    }
    parts.join(", ")
}
