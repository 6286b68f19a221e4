//! Diff computation and display

use colored::Colorize;
use declarative::{ChangeSet, Resource, diff};

/// What converging one resource would do
#[derive(Debug, Clone)]
pub enum Pending {
    Change(ChangeSet),
    /// The actual state could not be determined
    Error { resource: String, error: String },
}

/// Index into the planned resources paired with what is pending for it
pub type PendingDiff = (usize, Pending);

/// Compute diffs for all resources; unchanged resources are left out
pub fn compute_diffs(resources: &[Resource]) -> Vec<PendingDiff> {
    resources
        .iter()
        .enumerate()
        .filter_map(|(index, resource)| match diff(resource, &[]) {
            Ok(None) => None,
            Ok(Some(changes)) => Some((index, Pending::Change(changes))),
            Err(e) => Some((
                index,
                Pending::Error {
                    resource: resource.to_string(),
                    error: e.to_string(),
                },
            )),
        })
        .collect()
}

/// Display pending diffs in a user-friendly format
pub fn display_diff(diffs: &[PendingDiff]) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Configuration Diff".bold()
    );
    println!("│");

    let mut creates = 0;
    let mut updates = 0;
    let mut errors = 0;

    for (_, pending) in diffs {
        match pending {
            Pending::Change(changes) => {
                let symbol = if changes.is_create() {
                    creates += 1;
                    "+".green()
                } else {
                    updates += 1;
                    "~".yellow()
                };
                let description = changes.description();
                println!(
                    "│ {} {:<40} {}",
                    symbol,
                    changes.resource,
                    description[0].dimmed()
                );
                for line in description.iter().skip(1) {
                    println!("│     {}", line.dimmed());
                }
            }
            Pending::Error { resource, error } => {
                errors += 1;
                println!("│ {} {:<40} {}", "✗".red(), resource, error.red());
            }
        }
    }

    println!("│");
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} to create, {} to update, {} unreadable",
        creates.to_string().green(),
        updates.to_string().yellow(),
        errors.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}
