//! Shared run pipeline used by `shopsync run` and `shopsync diff`.
//!
//! One run walks `Init → ConfigLoaded → Fetched → Diffed → Applying →
//! Done`. Only the fail-fast stages (config, fetch) can reach `Failed`;
//! once applying starts the run always reaches `Done`, carrying per-item
//! results. Runs are stateless and safe to interleave with other runs.

use chrono::Utc;

use shopsync_client::{LocalFeed, ProductApi};
use shopsync_core::SyncConfig;

use crate::apply::{apply, ApplyReport};
use crate::diff::compute_diff;
use crate::error::RunError;
use crate::report::RunReport;

/// Phases of one reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    ConfigLoaded,
    Fetched,
    Diffed,
    Applying,
    Done,
    Failed,
}

impl RunState {
    /// Legal phase transitions. `Failed` is terminal and only reachable
    /// from the fail-fast stages; `Diffed → Done` is the dry-run shortcut.
    pub fn can_transition(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Init, ConfigLoaded)
                | (ConfigLoaded, Fetched)
                | (ConfigLoaded, Failed)
                | (Fetched, Diffed)
                | (Fetched, Failed)
                | (Diffed, Applying)
                | (Diffed, Done)
                | (Applying, Done)
        )
    }
}

fn advance(state: &mut RunState, next: RunState) {
    debug_assert!(
        state.can_transition(next),
        "illegal run transition {state:?} -> {next:?}"
    );
    tracing::debug!("run state: {:?} -> {:?}", state, next);
    *state = next;
}

/// Load configuration from the environment, as the first pipeline stage.
pub fn load_config() -> Result<SyncConfig, RunError> {
    Ok(SyncConfig::from_env()?)
}

/// Execute one reconciliation run.
///
/// With `dry_run` the pipeline stops after the diff and the apply report
/// stays empty. Fetch failures abort with [`RunError`]; apply failures do
/// not — they are carried in the report.
pub fn run(
    config: &SyncConfig,
    feed: &impl LocalFeed,
    api: &impl ProductApi,
    dry_run: bool,
) -> Result<RunReport, RunError> {
    let started_at = Utc::now();
    let mut state = RunState::Init;
    advance(&mut state, RunState::ConfigLoaded);

    let local = match feed.fetch(&config.subfamilies) {
        Ok(products) => products,
        Err(err) => {
            advance(&mut state, RunState::Failed);
            return Err(RunError::Feed(err));
        }
    };
    let remote = match api.fetch_catalog() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            advance(&mut state, RunState::Failed);
            return Err(RunError::Fetch(err));
        }
    };
    advance(&mut state, RunState::Fetched);

    let allowed = config.subfamilies.iter().cloned().collect();
    let diff = compute_diff(&local, &remote, &allowed, &config.publication_id);
    advance(&mut state, RunState::Diffed);

    let apply_report = if dry_run {
        advance(&mut state, RunState::Done);
        ApplyReport::default()
    } else {
        advance(&mut state, RunState::Applying);
        let report = apply(api, &diff);
        advance(&mut state, RunState::Done);
        report
    };

    Ok(RunReport {
        started_at,
        finished_at: Utc::now(),
        dry_run,
        local_count: local.len(),
        remote_count: remote.len(),
        diff,
        apply: apply_report,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
