//! Convergence - apply only what differs
//!
//! [`converge`] diffs the requested properties, skips when nothing changed,
//! and otherwise runs the caller's apply step between start/success/failure
//! notifications. Failures are reported once and never retried.

use crate::diff::{ChangeSet, diff};
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::types::{ChangeAction, Outcome};
use std::sync::Arc;

/// Converge `names` (all properties when empty) on `resource`
///
/// Returns the applied change set, or `None` when the resource exists and
/// every explicitly set property already matches.
pub fn converge<F>(resource: &Resource, names: &[&str], apply: F) -> Result<Option<ChangeSet>>
where
    F: FnOnce(&ChangeSet) -> anyhow::Result<()>,
{
    let events = Arc::clone(resource.events());

    let Some(changes) = diff(resource, names)? else {
        events.action_skipped(resource, "unchanged");
        return Ok(None);
    };

    let description = changes.description();
    events.action_started(resource, &description);

    match apply(&changes) {
        Ok(()) => {
            events.action_succeeded(resource, &description, true);
            Ok(Some(changes))
        }
        Err(e) => {
            let message = format!("{e:#}");
            events.action_failed(resource, &description, &message);
            Err(Error::Apply {
                resource: resource.to_string(),
                message,
            })
        }
    }
}

/// Summarize a convergence result for reporting
pub fn outcome(result: &Result<Option<ChangeSet>>) -> Outcome {
    match result {
        Ok(None) => Outcome::Unchanged,
        Ok(Some(changes)) => match changes.action {
            ChangeAction::Create => Outcome::Created,
            ChangeAction::Update => Outcome::Updated,
        },
        Err(e) => Outcome::Failed {
            error: e.to_string(),
        },
    }
}

impl Resource {
    /// See [`converge`]
    pub fn converge<F>(&self, names: &[&str], apply: F) -> Result<Option<ChangeSet>>
    where
        F: FnOnce(&ChangeSet) -> anyhow::Result<()>,
    {
        converge(self, names, apply)
    }

    /// Freeze the desired state and converge every property through the
    /// schema's driver
    pub fn update(&mut self) -> Result<Option<ChangeSet>> {
        self.fully_defined()?;

        let events = Arc::clone(self.events());
        let driver = Arc::clone(self.schema().driver());
        events.update_started(self);

        let result = converge(self, &[], |changes| driver.apply(self, changes));
        match &result {
            Ok(changes) => events.update_succeeded(self, changes.is_some()),
            Err(e) => events.update_failed(self, &e.to_string()),
        }
        result
    }
}
