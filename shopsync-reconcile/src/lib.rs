//! # shopsync-reconcile
//!
//! Diff/apply reconciliation between the local feed and the remote catalog.
//!
//! Call [`pipeline::run`] with a loaded config and the two clients; it is
//! the canonical entrypoint for both `shopsync run` and `shopsync diff`.

pub mod apply;
pub mod diff;
pub mod error;
pub mod pipeline;
pub mod report;

pub use apply::{ApplyFailure, ApplyReport};
pub use diff::{compute_diff, Diff};
pub use error::RunError;
pub use pipeline::{run, RunState};
pub use report::RunReport;
