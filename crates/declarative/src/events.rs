//! Notification sinks
//!
//! The core reports lifecycle transitions, loads and convergence steps to a
//! [`ResourceEvents`] implementation and leaves rendering to it. This lets
//! the crate be used without depending on a specific console or log format.

use crate::resource::Resource;

/// Receives lifecycle and convergence notifications
pub trait ResourceEvents: Send + Sync {
    /// A resource instance was created
    fn created(&self, resource: &Resource);

    /// Identity is complete and frozen
    fn identity_defined(&self, resource: &Resource);

    /// Desired state is complete and frozen
    fn fully_defined(&self, resource: &Resource);

    /// The actual state is about to be loaded
    fn load_started(&self, resource: &Resource);

    /// The actual state was loaded
    fn load_succeeded(&self, resource: &Resource, exists: bool);

    /// Loading the actual state failed
    fn load_failed(&self, resource: &Resource, error: &str);

    /// A full update (converge every property) started
    fn update_started(&self, resource: &Resource);

    /// A full update finished; `updated` is false when nothing changed
    fn update_succeeded(&self, resource: &Resource, updated: bool);

    /// A full update failed
    fn update_failed(&self, resource: &Resource, error: &str);

    /// A change is about to be applied
    fn action_started(&self, resource: &Resource, description: &[String]);

    /// A change was applied
    fn action_succeeded(&self, resource: &Resource, description: &[String], updated: bool);

    /// Applying a change failed
    fn action_failed(&self, resource: &Resource, description: &[String], error: &str);

    /// Nothing to apply
    fn action_skipped(&self, resource: &Resource, reason: &str);
}

/// Sink that drops every notification
pub struct NoEvents;

impl ResourceEvents for NoEvents {
    fn created(&self, _resource: &Resource) {}
    fn identity_defined(&self, _resource: &Resource) {}
    fn fully_defined(&self, _resource: &Resource) {}
    fn load_started(&self, _resource: &Resource) {}
    fn load_succeeded(&self, _resource: &Resource, _exists: bool) {}
    fn load_failed(&self, _resource: &Resource, _error: &str) {}
    fn update_started(&self, _resource: &Resource) {}
    fn update_succeeded(&self, _resource: &Resource, _updated: bool) {}
    fn update_failed(&self, _resource: &Resource, _error: &str) {}
    fn action_started(&self, _resource: &Resource, _description: &[String]) {}
    fn action_succeeded(&self, _resource: &Resource, _description: &[String], _updated: bool) {}
    fn action_failed(&self, _resource: &Resource, _description: &[String], _error: &str) {}
    fn action_skipped(&self, _resource: &Resource, _reason: &str) {}
}

/// Default sink: forwards everything to the `log` facade
pub struct LogEvents;

impl ResourceEvents for LogEvents {
    fn created(&self, resource: &Resource) {
        log::trace!("{} created", resource.schema().name());
    }

    fn identity_defined(&self, resource: &Resource) {
        log::trace!("{resource}: identity defined");
    }

    fn fully_defined(&self, resource: &Resource) {
        log::trace!("{resource}: fully defined");
    }

    fn load_started(&self, resource: &Resource) {
        log::debug!("{resource}: loading current state");
    }

    fn load_succeeded(&self, resource: &Resource, exists: bool) {
        if exists {
            log::debug!("{resource}: loaded");
        } else {
            log::debug!("{resource}: does not exist");
        }
    }

    fn load_failed(&self, resource: &Resource, error: &str) {
        log::warn!("{resource}: load failed: {error}");
    }

    fn update_started(&self, resource: &Resource) {
        log::debug!("{resource}: update started");
    }

    fn update_succeeded(&self, resource: &Resource, updated: bool) {
        if updated {
            log::info!("{resource}: updated");
        } else {
            log::debug!("{resource}: up to date");
        }
    }

    fn update_failed(&self, resource: &Resource, error: &str) {
        log::error!("{resource}: update failed: {error}");
    }

    fn action_started(&self, resource: &Resource, description: &[String]) {
        log::debug!("{resource}: {}", description.join("; "));
    }

    fn action_succeeded(&self, resource: &Resource, description: &[String], _updated: bool) {
        for line in description {
            log::info!("{resource}: {line}");
        }
    }

    fn action_failed(&self, resource: &Resource, description: &[String], error: &str) {
        log::error!("{resource}: {} failed: {error}", description.first().map_or("", String::as_str));
    }

    fn action_skipped(&self, resource: &Resource, reason: &str) {
        log::debug!("{resource}: {reason}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDriver, RecordingEvents, person};
    use std::sync::Arc;

    #[test]
    fn test_no_events_silences_a_resource() {
        let events = Arc::new(RecordingEvents::default());
        let schema = person(FakeDriver::absent())
            .extend("person")
            .events(events.clone())
            .build();
        let mut r = schema.open_positional(vec![5.into()]).unwrap();
        assert_eq!(events.take(), vec!["created person", "identity_defined person[5]"]);

        r.set_events(Arc::new(NoEvents));
        r.set("name", "Ann").unwrap();
        assert!(r.update().unwrap().is_some());
        assert!(events.take().is_empty());
    }
}
