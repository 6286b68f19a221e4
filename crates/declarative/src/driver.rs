//! Driver trait - the concrete body behind a resource schema
//!
//! The core never touches the real world itself. A schema's driver is asked
//! to describe what currently exists (`load`) and to change it (`apply`).

use crate::diff::ChangeSet;
use crate::resource::Resource;
use anyhow::Result;
use std::fmt;

/// Load/apply contract implemented by concrete resource types
///
/// # Example
///
/// ```ignore
/// use declarative::{ChangeSet, Resource, ResourceDriver};
///
/// #[derive(Debug)]
/// struct EnvVar;
///
/// impl ResourceDriver for EnvVar {
///     fn load(&self, current: &mut Resource) -> anyhow::Result<()> {
///         let name = current.get("name")?.to_string();
///         match std::env::var(&name) {
///             Ok(value) => current.set("value", value)?,
///             Err(_) => current.set_exists(false)?,
///         }
///         Ok(())
///     }
///
///     fn apply(&self, desired: &Resource, _changes: &ChangeSet) -> anyhow::Result<()> {
///         let name = desired.get("name")?.to_string();
///         let value = desired.get("value")?.to_string();
///         unsafe { std::env::set_var(name, value) };
///         Ok(())
///     }
/// }
/// ```
pub trait ResourceDriver: Send + Sync + fmt::Debug {
    /// Populate the actual instance
    ///
    /// `current` carries the identity of the resource being converged. The
    /// hook either sets the properties it can discover, or calls
    /// `set_exists(false)`, or fails. It runs at most once per resource.
    fn load(&self, current: &mut Resource) -> Result<()> {
        let _ = current;
        Ok(())
    }

    /// Make the real world match `desired`
    ///
    /// Only called with a non-empty diff (or for a resource that does not
    /// exist yet). Failures are reported, never retried.
    fn apply(&self, desired: &Resource, changes: &ChangeSet) -> Result<()>;
}

/// Driver with nothing behind it: loads nothing, applies nothing
#[derive(Debug, Default)]
pub struct NoDriver;

impl ResourceDriver for NoDriver {
    fn apply(&self, _desired: &Resource, _changes: &ChangeSet) -> Result<()> {
        Ok(())
    }
}
