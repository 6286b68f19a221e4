//! Execution engine
//!
//! The engine orchestrates:
//! 1. Planning - Open manifest entries as resources
//! 2. Diffing - Compare desired values against the loaded actual state
//! 3. Executing - Converge what differs, one resource at a time

pub mod differ;
pub mod executor;
pub mod planner;

pub use executor::{ExecuteOptions, execute};
pub use planner::{parse_target, plan};
