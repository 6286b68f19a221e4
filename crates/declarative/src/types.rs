//! Core types for declarative resource management

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a resource instance; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Only identity properties may be assigned
    Created,
    /// Identity is frozen, desired state is still being described
    IdentityDefined,
    /// Everything is frozen
    FullyDefined,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::IdentityDefined => write!(f, "identity defined"),
            Self::FullyDefined => write!(f, "fully defined"),
        }
    }
}

/// Which values a snapshot includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotMode {
    /// Desired values over already-loaded actual values; never loads
    OnlyKnown,
    /// Explicitly set values that differ from the current value; may load
    OnlyChanged,
    /// Exactly the explicitly set values; never loads
    OnlyExplicit,
    /// Every property, resolved; may load
    All,
}

/// What a convergence does to the real-world target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    Create,
    Update,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Result of converging a single resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// No changes needed
    Unchanged,
    /// Resource was created
    Created,
    /// Resource was updated
    Updated,
    /// Convergence failed
    Failed { error: String },
    /// Convergence was not attempted
    Skipped { reason: String },
}

/// Summary of converging a batch of resources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvergeSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ConvergeSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated
    }

    /// Check if every resource converged (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.skipped + self.failed
    }

    /// Add an outcome to the summary
    pub fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
        }
    }
}
