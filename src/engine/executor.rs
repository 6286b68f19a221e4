//! Execution engine - converges planned resources with console output

use anyhow::Result;
use colored::Colorize;
use declarative::{ConvergeSummary, Outcome, Resource, outcome};
use std::sync::Arc;

use super::differ::{Pending, compute_diffs, display_diff};
use crate::ui::{self, ConsoleEvents};

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Verbose output
    pub verbose: bool,
}

/// Converge every resource that differs from its actual state
///
/// Resources are converged one at a time, in planned order. A failure is
/// counted and reported but does not stop the remaining resources.
pub fn execute(resources: &mut [Resource], opts: &ExecuteOptions) -> Result<ConvergeSummary> {
    let events = Arc::new(ConsoleEvents {
        verbose: opts.verbose,
    });
    for resource in resources.iter_mut() {
        resource.set_events(events.clone());
    }

    // 1. Compute and display what will change
    let diffs = compute_diffs(resources);
    display_diff(&diffs);

    let mut summary = ConvergeSummary {
        unchanged: resources.len() - diffs.len(),
        ..Default::default()
    };

    if diffs.is_empty() {
        return Ok(summary);
    }

    // 2. Confirm (unless --yes)
    if !opts.yes && !opts.dry_run && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        skip_all(&mut summary, diffs.len(), "aborted");
        return Ok(summary);
    }

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        skip_all(&mut summary, diffs.len(), "dry run");
        return Ok(summary);
    }

    // 3. Converge
    println!();
    println!(
        "  {} Applying {}...",
        "→".cyan(),
        ui::plural(diffs.len(), "resource")
    );

    for (index, pending) in &diffs {
        let result = match pending {
            Pending::Change(_) => outcome(&resources[*index].update()),
            Pending::Error { resource, error } => {
                println!("  {} {} - {}", "✗".red(), resource, error.red());
                Outcome::Failed {
                    error: error.clone(),
                }
            }
        };
        summary.add(&result);
    }

    // 4. Summary
    print_summary(&summary);

    Ok(summary)
}

/// Count `count` pending resources as skipped
fn skip_all(summary: &mut ConvergeSummary, count: usize, reason: &str) {
    let skipped = Outcome::Skipped {
        reason: reason.to_string(),
    };
    for _ in 0..count {
        summary.add(&skipped);
    }
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Print execution summary
fn print_summary(summary: &ConvergeSummary) {
    println!();
    if summary.is_success() {
        println!(
            "  {} Applied {} ({} created, {} updated, {} unchanged)",
            "✓".green(),
            ui::plural(summary.total_changes(), "change"),
            summary.created,
            summary.updated,
            summary.unchanged
        );
    } else {
        println!(
            "  {} {} succeeded, {} of {} failed",
            "⚠".yellow(),
            ui::plural(summary.total_changes(), "change"),
            summary.failed.to_string().red(),
            ui::plural(summary.total(), "resource")
        );
    }
}
