//! Test fixtures shared by the module tests

use crate::contract::TypeContract;
use crate::diff::ChangeSet;
use crate::driver::ResourceDriver;
use crate::events::ResourceEvents;
use crate::property::PropertyOptions;
use crate::resource::Resource;
use crate::schema::ResourceSchema;
use crate::value::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// `person`: identity `id` (integer), `name` (text, default "unknown")
pub fn person(driver: Arc<FakeDriver>) -> Arc<ResourceSchema> {
    ResourceSchema::builder("person")
        .property("id", TypeContract::integer(), PropertyOptions::new().identity())
        .unwrap()
        .property("name", TypeContract::text(), PropertyOptions::new().default("unknown"))
        .unwrap()
        .driver(driver)
        .build()
}

/// Driver serving a fixed actual state and counting calls
#[derive(Debug, Default)]
pub struct FakeDriver {
    actual: Option<Vec<(&'static str, Value)>>,
    load_error: Option<String>,
    apply_error: Mutex<Option<String>>,
    loads: AtomicUsize,
    applies: AtomicUsize,
}

impl FakeDriver {
    /// The resource exists with these values
    pub fn present(values: impl IntoIterator<Item = (&'static str, Value)>) -> Arc<Self> {
        Arc::new(Self {
            actual: Some(values.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn absent() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            load_error: Some(message.to_string()),
            ..Self::default()
        })
    }

    pub fn fail_apply(self: Arc<Self>, message: &str) -> Arc<Self> {
        *self.apply_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn applies(&self) -> usize {
        self.applies.load(Ordering::SeqCst)
    }
}

impl ResourceDriver for FakeDriver {
    fn load(&self, current: &mut Resource) -> anyhow::Result<()> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.load_error {
            anyhow::bail!("{message}");
        }
        match &self.actual {
            Some(values) => {
                for (name, value) in values {
                    current.set(name, value.clone())?;
                }
            }
            None => current.set_exists(false)?,
        }
        Ok(())
    }

    fn apply(&self, _desired: &Resource, _changes: &ChangeSet) -> anyhow::Result<()> {
        self.applies.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.apply_error.lock().unwrap().as_ref() {
            anyhow::bail!("{message}");
        }
        Ok(())
    }
}

/// Records every notification as a line of text
#[derive(Debug, Default)]
pub struct RecordingEvents {
    lines: Mutex<Vec<String>>,
}

impl RecordingEvents {
    /// Drain what was recorded so far
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap())
    }

    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
}

impl ResourceEvents for RecordingEvents {
    fn created(&self, resource: &Resource) {
        self.push(format!("created {}", resource.schema().name()));
    }

    fn identity_defined(&self, resource: &Resource) {
        self.push(format!("identity_defined {resource}"));
    }

    fn fully_defined(&self, resource: &Resource) {
        self.push(format!("fully_defined {resource}"));
    }

    fn load_started(&self, resource: &Resource) {
        self.push(format!("load_started {resource}"));
    }

    fn load_succeeded(&self, resource: &Resource, exists: bool) {
        self.push(format!("load_succeeded {resource} exists={exists}"));
    }

    fn load_failed(&self, resource: &Resource, error: &str) {
        self.push(format!("load_failed {resource}: {error}"));
    }

    fn update_started(&self, resource: &Resource) {
        self.push(format!("update_started {resource}"));
    }

    fn update_succeeded(&self, resource: &Resource, updated: bool) {
        self.push(format!("update_succeeded {resource} updated={updated}"));
    }

    fn update_failed(&self, resource: &Resource, error: &str) {
        self.push(format!("update_failed {resource}: {error}"));
    }

    fn action_started(&self, resource: &Resource, description: &[String]) {
        self.push(format!("action_started {resource} {}", description[0]));
    }

    fn action_succeeded(&self, resource: &Resource, description: &[String], _updated: bool) {
        self.push(format!("action_succeeded {resource} {}", description[0]));
    }

    fn action_failed(&self, resource: &Resource, description: &[String], error: &str) {
        self.push(format!("action_failed {resource} {}: {error}", description[0]));
    }

    fn action_skipped(&self, resource: &Resource, reason: &str) {
        self.push(format!("action_skipped {resource} {reason}"));
    }
}
