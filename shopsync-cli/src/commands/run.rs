//! `shopsync run` — full fetch/diff/apply cycle.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use shopsync_reconcile::RunReport;

use crate::commands::{describe_plan, execute};

/// Arguments for `shopsync run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Compute the diff but apply nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Exit non-zero when more than N items fail to apply.
    /// Without this flag partial failures still exit 0.
    #[arg(long, value_name = "N")]
    pub max_failures: Option<usize>,

    /// Print the full report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let report = execute(self.dry_run).context("run failed")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }

        if !report.within_tolerance(self.max_failures) {
            bail!(
                "{} items failed to apply, exceeding --max-failures {}",
                report.apply.failed(),
                self.max_failures.unwrap_or(0)
            );
        }
        Ok(())
    }
}

fn print_report(report: &RunReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    println!(
        "{prefix}{} {} local / {} remote — {} created, {} updated, {} unchanged, {} failed",
        "✓".green(),
        report.local_count,
        report.remote_count,
        report.apply.created,
        report.apply.updated,
        report.diff.unchanged,
        report.apply.failed(),
    );

    if report.dry_run {
        for product in &report.diff.to_create {
            println!("  + {}", product.sku);
        }
        for (remote, plan) in &report.diff.to_update {
            println!("  ~ {} ({})", remote.sku, describe_plan(plan));
        }
    }

    for failure in &report.apply.failures {
        println!("  {} {} — {}", "✗".red(), failure.sku, failure.reason);
    }
}
