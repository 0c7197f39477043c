//! Error types for shopsync-reconcile.
//!
//! Only the fail-fast stages produce a [`RunError`]; per-item apply
//! failures are carried inside the run report instead.

use thiserror::Error;

use shopsync_client::ClientError;
use shopsync_core::ConfigError;

/// Errors that abort a run before the apply phase.
#[derive(Debug, Error)]
pub enum RunError {
    /// Missing/malformed configuration; fatal, never retried.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The local feed could not be fetched.
    #[error("feed fetch failed: {0}")]
    Feed(ClientError),

    /// The remote catalog snapshot could not be fetched.
    #[error("catalog fetch failed: {0}")]
    Fetch(ClientError),
}
