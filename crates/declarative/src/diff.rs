//! Change detection between desired and actual property values

use crate::error::Result;
use crate::property::Property;
use crate::resource::Resource;
use crate::types::ChangeAction;
use crate::value::Value;
use serde::Serialize;

/// One property whose desired value differs from the actual one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyChange {
    pub name: String,
    pub desired: Value,
    /// `None` when the resource does not exist yet
    pub actual: Option<Value>,
    pub desired_display: String,
    pub actual_display: Option<String>,
}

impl PropertyChange {
    fn new(property: &Property, desired: Value, actual: Option<Value>) -> Self {
        Self {
            name: property.name().to_string(),
            desired_display: property.display_value(&desired),
            actual_display: actual.as_ref().map(|v| property.display_value(v)),
            desired,
            actual,
        }
    }
}

/// The minimal set of changes needed to converge one resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSet {
    /// Display name of the resource, e.g. `file[/tmp/a]`
    pub resource: String,
    pub action: ChangeAction,
    pub changes: Vec<PropertyChange>,
}

impl ChangeSet {
    /// Changed property names, in schema order
    pub fn names(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyChange> {
        self.changes.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_create(&self) -> bool {
        self.action == ChangeAction::Create
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Header line followed by one aligned `set` line per change
    ///
    /// ```text
    /// update content, mode
    /// set content to "new" (was "old")
    /// set mode    to 384 (was 420)
    /// ```
    pub fn description(&self) -> Vec<String> {
        let width = self.changes.iter().map(|c| c.name.len()).max().unwrap_or(0);

        let mut lines = Vec::with_capacity(self.changes.len() + 1);
        let names = self.names();
        lines.push(if names.is_empty() {
            self.action.to_string()
        } else {
            format!("{} {}", self.action, names.join(", "))
        });
        for change in &self.changes {
            let line = match &change.actual_display {
                Some(actual) => format!(
                    "set {:<width$} to {} (was {actual})",
                    change.name, change.desired_display
                ),
                None => format!("set {:<width$} to {}", change.name, change.desired_display),
            };
            lines.push(line);
        }
        lines
    }
}

/// Compute what converging `names` on `resource` would change
///
/// An empty `names` means every property of the schema. Only explicitly set
/// properties are compared. Returns `None` when the resource exists and
/// nothing differs. Never applies and never notifies, but may trigger the
/// load of the actual instance.
pub fn diff(resource: &Resource, names: &[&str]) -> Result<Option<ChangeSet>> {
    let schema = resource.schema();
    let properties: Vec<&Property> = if names.is_empty() {
        schema.properties().iter().collect()
    } else {
        names
            .iter()
            .map(|name| schema.accessor(name).map(|(p, _)| p))
            .collect::<Result<_>>()?
    };

    let exists = resource.resource_exists()?;
    let mut changes = Vec::new();

    for property in properties {
        if !resource.is_set(property.name()) {
            continue;
        }
        let desired = property.get(resource)?;
        if exists {
            let actual = property.current_value(resource)?;
            if desired != actual {
                changes.push(PropertyChange::new(property, desired, Some(actual)));
            }
        } else {
            changes.push(PropertyChange::new(property, desired, None));
        }
    }

    if exists && changes.is_empty() {
        return Ok(None);
    }

    Ok(Some(ChangeSet {
        resource: resource.to_string(),
        action: if exists {
            ChangeAction::Update
        } else {
            ChangeAction::Create
        },
        changes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::TypeContract;
    use crate::property::PropertyOptions;
    use crate::schema::ResourceSchema;
    use crate::testing::{FakeDriver, person};
    use std::sync::Arc;

    fn file(driver: Arc<FakeDriver>) -> Arc<ResourceSchema> {
        ResourceSchema::builder("file")
            .property("path", TypeContract::path(), PropertyOptions::new().identity())
            .unwrap()
            .property("content", TypeContract::text(), PropertyOptions::new())
            .unwrap()
            .property("mode", TypeContract::integer(), PropertyOptions::new())
            .unwrap()
            .property("secret", TypeContract::text(), PropertyOptions::new().sensitive())
            .unwrap()
            .driver(driver)
            .build()
    }

    #[test]
    fn test_only_explicit_differing_properties_are_reported() {
        let driver = FakeDriver::present([
            ("content", Value::from("old")),
            ("mode", Value::from(420)),
        ]);
        let schema = file(driver);
        let mut r = schema.open_positional(vec!["/tmp/a".into()]).unwrap();
        r.set("content", "new").unwrap();
        r.set("mode", 420).unwrap();

        let changes = diff(&r, &[]).unwrap().unwrap();
        assert_eq!(changes.action, ChangeAction::Update);
        assert_eq!(changes.names(), vec!["content"]);

        let content = changes.get("content").unwrap();
        assert_eq!(content.desired, Value::from("new"));
        assert_eq!(content.actual, Some(Value::from("old")));
    }

    #[test]
    fn test_unset_property_is_never_compared() {
        let schema = file(FakeDriver::present([("mode", Value::from(420))]));
        let r = schema.open_positional(vec!["/tmp/a".into()]).unwrap();
        assert!(diff(&r, &["mode"]).unwrap().is_none());
    }

    #[test]
    fn test_absent_resource_reports_every_explicit_property() {
        let schema = file(FakeDriver::absent());
        let mut r = schema.open_positional(vec!["/tmp/a".into()]).unwrap();
        r.set("content", "hello").unwrap();

        let changes = diff(&r, &[]).unwrap().unwrap();
        assert!(changes.is_create());
        // The identity itself was set explicitly
        assert_eq!(changes.names(), vec!["path", "content"]);
        assert!(changes.changes.iter().all(|c| c.actual.is_none()));
    }

    #[test]
    fn test_absent_resource_with_only_identity() {
        let schema = person(FakeDriver::absent());
        let r = schema.open_positional(vec![5.into()]).unwrap();
        let changes = diff(&r, &["name"]).unwrap().unwrap();
        assert!(changes.is_create());
        assert!(changes.is_empty());
        assert_eq!(changes.description(), vec!["create"]);
    }

    #[test]
    fn test_description_aligns_names() {
        let driver = FakeDriver::present([
            ("content", Value::from("old")),
            ("mode", Value::from(420)),
        ]);
        let schema = file(driver);
        let mut r = schema.open_positional(vec!["/tmp/a".into()]).unwrap();
        r.set("content", "new").unwrap();
        r.set("mode", 384).unwrap();

        let changes = diff(&r, &[]).unwrap().unwrap();
        assert_eq!(
            changes.description(),
            vec![
                "update content, mode",
                "set content to \"new\" (was \"old\")",
                "set mode    to 384 (was 420)",
            ]
        );
    }

    #[test]
    fn test_create_description_has_no_previous_value() {
        let schema = file(FakeDriver::absent());
        let mut r = schema.open_positional(vec!["/tmp/a".into()]).unwrap();
        r.set("mode", 384).unwrap();

        let changes = diff(&r, &["mode"]).unwrap().unwrap();
        assert_eq!(changes.description(), vec!["create mode", "set mode to 384"]);
    }

    #[test]
    fn test_sensitive_values_are_suppressed() {
        let schema = file(FakeDriver::present([("secret", Value::from("a"))]));
        let mut r = schema.open_positional(vec!["/tmp/a".into()]).unwrap();
        r.set("secret", "b").unwrap();

        let changes = diff(&r, &["secret"]).unwrap().unwrap();
        let lines = changes.description();
        assert!(!lines.iter().any(|l| l.contains("\"b\"") || l.contains("\"a\"")));
        assert!(lines[1].contains(crate::property::SUPPRESSED));
        // Raw values stay available to the driver
        assert_eq!(changes.get("secret").unwrap().desired, Value::from("b"));
    }

    #[test]
    fn test_unknown_name_is_argument_error() {
        let schema = file(FakeDriver::absent());
        let r = schema.open_positional(vec!["/tmp/a".into()]).unwrap();
        assert!(diff(&r, &["owner"]).unwrap_err().is_argument());
    }
}
