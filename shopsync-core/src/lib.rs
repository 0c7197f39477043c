//! # shopsync-core
//!
//! Domain types and configuration for the shopsync reconciliation job.
//!
//! Build a [`SyncConfig`] once at startup with [`SyncConfig::from_env`] and
//! pass it by reference everywhere; no other component reads ambient
//! environment state.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AccessToken, SyncConfig};
pub use error::ConfigError;
pub use types::{parse_decimal_es, LocalProduct, Price, RemoteId, RemoteProduct, Sku, UpdatePlan};
