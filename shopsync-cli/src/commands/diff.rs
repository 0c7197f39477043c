//! `shopsync diff` — show planned operations without applying anything.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::commands::{describe_plan, execute};

/// Arguments for `shopsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Print the diff as JSON.
    #[arg(long)]
    pub json: bool,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let report = execute(true).context("diff failed")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report.diff)?);
            return Ok(());
        }

        if report.diff.is_empty() {
            println!(
                "{} catalog in sync ({} items unchanged)",
                "✓".green(),
                report.diff.unchanged
            );
            return Ok(());
        }

        for product in &report.diff.to_create {
            println!("{} {} {} ({})", "+".green(), product.sku, product.title, product.price);
        }
        for (remote, plan) in &report.diff.to_update {
            println!("{} {} ({})", "~".yellow(), remote.sku, describe_plan(plan));
        }
        println!(
            "{} to create, {} to update, {} unchanged",
            report.diff.to_create.len(),
            report.diff.to_update.len(),
            report.diff.unchanged
        );
        Ok(())
    }
}
