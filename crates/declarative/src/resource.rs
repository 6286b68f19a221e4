//! Resource instances - live objects conforming to a schema
//!
//! A [`Resource`] holds the explicitly set (desired) values, a lifecycle
//! state, and a lazily loaded actual counterpart of the same schema.
//!
//! Lifecycle, forward only:
//!
//! - `Created`: only identity properties may be assigned.
//! - `IdentityDefined`: identity is frozen, desired state is writable.
//! - `FullyDefined`: everything is frozen.
//!
//! The actual instance is loaded at most once, on the first read that needs
//! it. A failed load is remembered and replayed, never retried.
//!
//! Instances are single-owner: values and state are mutated without locking.

use crate::error::{Error, Result};
use crate::events::ResourceEvents;
use crate::lazy::PropertyValue;
use crate::property::Property;
use crate::schema::ResourceSchema;
use crate::types::LifecycleState;
use crate::value::Value;
use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Desired,
    Actual,
}

/// Memoized outcome of loading the actual instance
enum ActualState {
    Present(Box<Resource>),
    Absent,
    Failed(String),
}

/// A live instance of a [`ResourceSchema`]
pub struct Resource {
    schema: Arc<ResourceSchema>,
    values: RefCell<HashMap<String, PropertyValue>>,
    state: LifecycleState,
    role: Role,
    exists: bool,
    actual: OnceCell<ActualState>,
    /// Set while the driver loads the actual instance
    loading: Cell<bool>,
    /// Set while the identity string is rendered
    rendering: Cell<bool>,
    events: Arc<dyn ResourceEvents>,
}

impl Resource {
    pub(crate) fn new(schema: Arc<ResourceSchema>) -> Self {
        let events = Arc::clone(schema.events());
        let resource = Self {
            schema,
            values: RefCell::new(HashMap::new()),
            state: LifecycleState::Created,
            role: Role::Desired,
            exists: true,
            actual: OnceCell::new(),
            loading: Cell::new(false),
            rendering: Cell::new(false),
            events,
        };
        resource.events.created(&resource);
        resource
    }

    pub fn schema(&self) -> &Arc<ResourceSchema> {
        &self.schema
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether this is the loaded counterpart of another instance
    pub fn is_actual(&self) -> bool {
        self.role == Role::Actual
    }

    pub fn events(&self) -> &Arc<dyn ResourceEvents> {
        &self.events
    }

    /// Route this instance's notifications elsewhere
    pub fn set_events(&mut self, events: Arc<dyn ResourceEvents>) {
        self.events = events;
    }

    /// Read a property
    pub fn get(&self, name: &str) -> Result<Value> {
        let (property, accessors) = self.schema.accessor(name)?;
        (accessors.read)(property, self)
    }

    /// Write a property; lazy values are stored unevaluated
    pub fn set(&mut self, name: &str, value: impl Into<PropertyValue>) -> Result<()> {
        let schema = Arc::clone(&self.schema);
        let (property, accessors) = schema.accessor(name)?;
        (accessors.write)(property, self, value.into())
    }

    /// The value the property has in the real world, ignoring what is set here
    pub fn current_value(&self, name: &str) -> Result<Value> {
        let (property, _) = self.schema.accessor(name)?;
        self.ensure_state_readable(property)?;
        property.current_value(self)
    }

    /// Whether the property has an explicitly set value
    pub fn is_set(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }

    /// Names with explicit values, in schema order
    pub fn explicit_names(&self) -> Vec<String> {
        let values = self.values.borrow();
        self.schema
            .properties()
            .iter()
            .filter(|p| values.contains_key(p.name()))
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Clear one explicit non-identity value
    pub fn reset(&mut self, name: &str) -> Result<()> {
        self.ensure_resettable()?;
        let (property, _) = self.schema.accessor(name)?;
        if property.is_identity() {
            return Err(self.property_defined(property, "identity properties cannot be reset"));
        }
        self.values.get_mut().remove(name);
        Ok(())
    }

    /// Clear every explicit non-identity value
    pub fn reset_all(&mut self) -> Result<()> {
        self.ensure_resettable()?;
        let schema = Arc::clone(&self.schema);
        self.values
            .get_mut()
            .retain(|name, _| schema.property(name).is_some_and(Property::is_identity));
        Ok(())
    }

    /// Signal that every identity property has been assigned
    pub fn identity_defined(&mut self) -> Result<()> {
        match self.state {
            LifecycleState::IdentityDefined => return Ok(()),
            LifecycleState::FullyDefined => {
                return Err(self.state_error("already fully defined"));
            }
            LifecycleState::Created => {}
        }

        let mut missing = Vec::new();
        for property in self.schema.required_identity_properties() {
            if property.get(self)?.is_null() {
                missing.push(format!("`{}`", property.name()));
            }
        }
        if !missing.is_empty() {
            return Err(Error::argument(format!(
                "{}: missing required identity {}",
                self.schema.name(),
                missing.join(", ")
            )));
        }

        self.state = LifecycleState::IdentityDefined;
        self.events.identity_defined(self);
        Ok(())
    }

    /// Signal that the desired state has been described
    pub fn fully_defined(&mut self) -> Result<()> {
        match self.state {
            LifecycleState::FullyDefined => return Ok(()),
            LifecycleState::Created => return Err(self.state_error("identity not yet defined")),
            LifecycleState::IdentityDefined => {}
        }

        for property in self.schema.properties() {
            if property.is_required()
                && !property.is_identity()
                && !self.is_set(property.name())
                && property.default_value_spec().is_none()
            {
                return Err(Error::validation(
                    format!("property `{}` is required", property.name()),
                    &Value::Null,
                ));
            }
        }

        self.state = LifecycleState::FullyDefined;
        self.events.fully_defined(self);
        Ok(())
    }

    /// The loaded actual counterpart; `None` when it does not exist
    ///
    /// Triggers the load on first call. The actual instance answers for
    /// itself.
    pub fn actual_instance(&self) -> Result<Option<&Resource>> {
        if self.role == Role::Actual {
            return Ok(self.exists.then_some(self));
        }
        if self.state == LifecycleState::Created {
            return Err(self.state_error("identity not yet defined; cannot load current state"));
        }

        // A lazy identity value may read state that needs this very load
        if self.actual.get().is_none() && self.loading.get() {
            return Err(self.state_error("current state is being loaded"));
        }

        let state = self.actual.get_or_init(|| {
            self.loading.set(true);
            let state = self.load_actual();
            self.loading.set(false);
            state
        });

        match state {
            ActualState::Present(actual) => Ok(Some(actual)),
            ActualState::Absent => Ok(None),
            ActualState::Failed(message) => Err(Error::Load {
                resource: self.to_string(),
                message: message.clone(),
            }),
        }
    }

    /// Whether the real-world target exists; loads if needed
    pub fn resource_exists(&self) -> Result<bool> {
        match self.role {
            Role::Actual => Ok(self.exists),
            Role::Desired => Ok(self.actual_instance()?.is_some()),
        }
    }

    /// Mark the target as present or absent; only legal on the actual instance
    pub fn set_exists(&mut self, exists: bool) -> Result<()> {
        if self.role != Role::Actual {
            return Err(self.state_error("only the actual instance can change existence"));
        }
        self.exists = exists;
        Ok(())
    }

    /// Identity rendered for humans
    ///
    /// Required identity values are listed as literals, optional ones as
    /// `name: value`. A single value renders in its plain form.
    pub fn identity_string(&self) -> String {
        // Nested renders come from errors raised while evaluating lazy identity
        if self.rendering.replace(true) {
            return String::new();
        }
        let rendered = self.render_identity();
        self.rendering.set(false);
        rendered
    }

    fn render_identity(&self) -> String {
        let values: Vec<(&Property, Value)> = self
            .schema
            .identity_properties()
            .into_iter()
            .filter_map(|p| p.get(self).ok().map(|v| (p, v)))
            .filter(|(_, v)| !v.is_null())
            .collect();

        match values.as_slice() {
            [] => String::new(),
            [(_, value)] => value.to_string(),
            _ => values
                .iter()
                .map(|(p, v)| {
                    if p.is_required() {
                        v.inspect()
                    } else {
                        format!("{}: {}", p.name(), v.inspect())
                    }
                })
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// The actual instance, only if it was already loaded
    pub(crate) fn loaded_actual(&self) -> Option<&Resource> {
        match self.actual.get() {
            Some(ActualState::Present(actual)) => Some(actual),
            _ => None,
        }
    }

    pub(crate) fn explicit_value(&self, name: &str) -> Option<PropertyValue> {
        self.values.borrow().get(name).cloned()
    }

    pub(crate) fn store(&mut self, name: &str, value: PropertyValue) {
        self.values.get_mut().insert(name.to_string(), value);
    }

    /// Record a loaded value without going through the lifecycle checks
    pub(crate) fn memoize(&self, name: &str, value: Value) {
        self.values
            .borrow_mut()
            .insert(name.to_string(), PropertyValue::Value(value));
    }

    pub(crate) fn ensure_state_readable(&self, property: &Property) -> Result<()> {
        if self.state == LifecycleState::Created && !property.is_identity() {
            return Err(self.state_error(&format!(
                "identity not yet defined; cannot read `{}`",
                property.name()
            )));
        }
        Ok(())
    }

    pub(crate) fn ensure_identity_writable(&self, property: &Property) -> Result<()> {
        match (self.state, self.role) {
            (LifecycleState::Created, _) | (LifecycleState::IdentityDefined, Role::Actual) => Ok(()),
            (LifecycleState::IdentityDefined, Role::Desired) => {
                Err(self.property_defined(property, "identity is already defined"))
            }
            (LifecycleState::FullyDefined, _) => {
                Err(self.property_defined(property, "resource is fully defined"))
            }
        }
    }

    pub(crate) fn ensure_state_writable(&self, property: &Property) -> Result<()> {
        match self.state {
            LifecycleState::Created => Err(self.state_error(&format!(
                "identity not yet defined; cannot set `{}`",
                property.name()
            ))),
            LifecycleState::IdentityDefined => Ok(()),
            LifecycleState::FullyDefined => {
                Err(self.property_defined(property, "resource is fully defined"))
            }
        }
    }

    fn ensure_resettable(&self) -> Result<()> {
        if self.state == LifecycleState::FullyDefined {
            return Err(self.state_error("cannot reset properties once fully defined"));
        }
        Ok(())
    }

    fn state_error(&self, message: &str) -> Error {
        Error::ResourceState {
            message: message.to_string(),
            resource: self.to_string(),
        }
    }

    fn property_defined(&self, property: &Property, message: &str) -> Error {
        Error::PropertyDefined {
            message: message.to_string(),
            resource: self.to_string(),
            property: property.name().to_string(),
        }
    }

    /// Build the actual counterpart, sharing resolved identity values
    fn new_actual(&self) -> Result<Resource> {
        let mut values = HashMap::new();
        for property in self.schema.identity_properties() {
            if let Some(stored) = self.explicit_value(property.name()) {
                let value = property.coerce_for_read(self, stored)?;
                values.insert(property.name().to_string(), PropertyValue::Value(value));
            }
        }

        Ok(Self {
            schema: Arc::clone(&self.schema),
            values: RefCell::new(values),
            state: LifecycleState::IdentityDefined,
            role: Role::Actual,
            exists: true,
            actual: OnceCell::new(),
            loading: Cell::new(false),
            rendering: Cell::new(false),
            events: Arc::clone(&self.events),
        })
    }

    fn load_actual(&self) -> ActualState {
        self.events.load_started(self);

        let loaded = self.new_actual().and_then(|mut actual| {
            let driver = Arc::clone(self.schema.driver());
            driver.load(&mut actual)?;
            Ok(actual)
        });

        match loaded {
            Ok(mut actual) => {
                actual.state = LifecycleState::FullyDefined;
                self.events.load_succeeded(self, actual.exists);
                if actual.exists {
                    ActualState::Present(Box::new(actual))
                } else {
                    ActualState::Absent
                }
            }
            Err(e) => {
                let message = match e {
                    Error::Other(e) => format!("{e:#}"),
                    other => other.to_string(),
                };
                self.events.load_failed(self, &message);
                ActualState::Failed(message)
            }
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.schema.name(), self.identity_string())
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("schema", &self.schema.name())
            .field("state", &self.state)
            .field("role", &self.role)
            .field("exists", &self.exists)
            .field("values", &self.values.borrow())
            .field("actual_loaded", &self.actual.get().is_some())
            .finish_non_exhaustive()
    }
}
