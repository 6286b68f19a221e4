//! Resource schemas - the declared shape of a kind of manageable thing
//!
//! A schema is built once with [`SchemaBuilder`] and shared behind an `Arc`.
//! Extending a schema copies the parent's descriptors; overriding a name
//! replaces the copy, never the parent's entry.

use crate::contract::TypeContract;
use crate::driver::{NoDriver, ResourceDriver};
use crate::error::{Error, Result};
use crate::events::{LogEvents, ResourceEvents};
use crate::lazy::PropertyValue;
use crate::property::{Accessors, Property, PropertyOptions};
use crate::resource::Resource;
use crate::value::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Anything [`ResourceSchema::coerce_to_instance`] accepts
pub enum ResourceInput {
    /// Passed through as `None`
    Nil,
    /// An existing instance of the schema (or a descendant)
    Instance(Resource),
    /// Property name to value, identity and desired state mixed
    Map(Vec<(String, PropertyValue)>),
    /// Bare identity values, matched positionally
    Identity(Vec<PropertyValue>),
}

impl From<Resource> for ResourceInput {
    fn from(resource: Resource) -> Self {
        Self::Instance(resource)
    }
}

impl From<BTreeMap<String, Value>> for ResourceInput {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Map(
            map.into_iter()
                .map(|(name, value)| (name, PropertyValue::Value(value)))
                .collect(),
        )
    }
}

/// The declared shape of a resource type
pub struct ResourceSchema {
    name: String,
    parent: Option<Arc<ResourceSchema>>,
    properties: Vec<Property>,
    accessors: HashMap<String, (usize, Accessors)>,
    driver: Arc<dyn ResourceDriver>,
    events: Arc<dyn ResourceEvents>,
}

impl ResourceSchema {
    /// Start declaring a new schema
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            parent: None,
            properties: Vec::new(),
            driver: Arc::new(NoDriver),
            events: Arc::new(LogEvents),
        }
    }

    /// Start declaring a schema that inherits this one
    ///
    /// Properties, driver and notification sink are inherited and may be
    /// overridden.
    pub fn extend(self: &Arc<Self>, name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            parent: Some(Arc::clone(self)),
            properties: self.properties.clone(),
            driver: Arc::clone(&self.driver),
            events: Arc::clone(&self.events),
        }
    }

    /// Resource type name, e.g. `file`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ResourceSchema>> {
        self.parent.as_ref()
    }

    /// Whether this schema is `other` or inherits from it
    pub fn is_a(&self, other: &ResourceSchema) -> bool {
        let mut current = Some(self);
        while let Some(schema) = current {
            if std::ptr::eq(schema, other) {
                return true;
            }
            current = schema.parent.as_deref();
        }
        false
    }

    /// Properties in declaration order
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.accessors.get(name).map(|(index, _)| &self.properties[*index])
    }

    /// Property plus its generated entry points
    pub fn accessor(&self, name: &str) -> Result<(&Property, Accessors)> {
        self.accessors
            .get(name)
            .map(|(index, accessors)| (&self.properties[*index], *accessors))
            .ok_or_else(|| {
                Error::argument(format!("unknown property `{name}` for `{}`", self.name))
            })
    }

    /// Identity properties, in declaration order
    pub fn identity_properties(&self) -> Vec<&Property> {
        self.properties.iter().filter(|p| p.is_identity()).collect()
    }

    /// Identity properties that must be given when opening, in order
    pub fn required_identity_properties(&self) -> Vec<&Property> {
        self.properties
            .iter()
            .filter(|p| p.is_identity() && p.is_required())
            .collect()
    }

    pub fn driver(&self) -> &Arc<dyn ResourceDriver> {
        &self.driver
    }

    pub fn events(&self) -> &Arc<dyn ResourceEvents> {
        &self.events
    }

    /// A blank instance in the `Created` state
    pub fn new_resource(self: &Arc<Self>) -> Resource {
        Resource::new(Arc::clone(self))
    }

    /// Open an instance from identity values
    ///
    /// Positional values fill the required identity properties in order;
    /// `named` may give any identity property by name. The returned instance
    /// has its identity defined.
    pub fn open(
        self: &Arc<Self>,
        positional: Vec<PropertyValue>,
        named: Vec<(String, PropertyValue)>,
    ) -> Result<Resource> {
        let required = self.required_identity_properties();
        if positional.len() > required.len() {
            let names: Vec<&str> = required.iter().map(|p| p.name()).collect();
            return Err(Error::argument(format!(
                "too many arguments for `{}`: expected at most {} ({}), got {}",
                self.name,
                required.len(),
                names.join(", "),
                positional.len()
            )));
        }

        let mut resource = self.new_resource();
        let mut assigned = HashSet::new();

        for (property, value) in required.iter().zip(positional) {
            property.set(&mut resource, value)?;
            assigned.insert(property.name().to_string());
        }

        for (name, value) in named {
            let (property, _) = self.accessor(&name)?;
            if !property.is_identity() {
                return Err(Error::argument(format!(
                    "`{name}` is not an identity property of `{}`",
                    self.name
                )));
            }
            if !assigned.insert(name.clone()) {
                return Err(Error::argument(format!(
                    "`{name}` given both positionally and by name"
                )));
            }
            property.set(&mut resource, value)?;
        }

        resource.identity_defined()?;
        Ok(resource)
    }

    /// Open an instance from positional identity values only
    pub fn open_positional(self: &Arc<Self>, args: Vec<PropertyValue>) -> Result<Resource> {
        self.open(args, Vec::new())
    }

    /// Normalize any accepted input into a fully defined instance
    pub fn coerce_to_instance(self: &Arc<Self>, input: ResourceInput) -> Result<Option<Resource>> {
        match input {
            ResourceInput::Nil => Ok(None),
            ResourceInput::Instance(resource) => {
                if resource.schema().is_a(self) {
                    Ok(Some(resource))
                } else {
                    Err(Error::argument(format!(
                        "expected a `{}` resource, got {resource}",
                        self.name
                    )))
                }
            }
            ResourceInput::Map(entries) => {
                let mut identity = Vec::new();
                let mut desired = Vec::new();
                for (name, value) in entries {
                    let (property, _) = self.accessor(&name)?;
                    if property.is_identity() {
                        identity.push((name, value));
                    } else {
                        desired.push((name, value));
                    }
                }

                let mut resource = self.open(Vec::new(), identity)?;
                for (name, value) in desired {
                    resource.set(&name, value)?;
                }
                resource.fully_defined()?;
                Ok(Some(resource))
            }
            ResourceInput::Identity(args) => {
                let mut resource = self.open_positional(args)?;
                resource.fully_defined()?;
                Ok(Some(resource))
            }
        }
    }
}

impl fmt::Debug for ResourceSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSchema")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("properties", &self.properties)
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ResourceSchema`]
pub struct SchemaBuilder {
    name: String,
    parent: Option<Arc<ResourceSchema>>,
    properties: Vec<Property>,
    driver: Arc<dyn ResourceDriver>,
    events: Arc<dyn ResourceEvents>,
}

impl SchemaBuilder {
    /// Register a property, applying inheritance rules
    ///
    /// If `name` already exists and no contract is given, the new descriptor
    /// is derived from the existing one. With a contract it starts fresh.
    /// Either way it keeps the position of the name it replaces.
    pub fn declare_property(
        mut self,
        name: &str,
        contract: Option<TypeContract>,
        options: PropertyOptions,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::argument(format!(
                "property names of `{}` must not be empty",
                self.name
            )));
        }

        let existing = self.properties.iter().position(|p| p.name() == name);
        match (existing, contract) {
            (Some(index), None) => {
                self.properties[index] = self.properties[index].derive(None, options)?;
            }
            (Some(index), Some(contract)) => {
                self.properties[index] = Property::declare(name, contract, options)?;
            }
            (None, contract) => {
                let contract = contract.unwrap_or_else(TypeContract::any);
                self.properties.push(Property::declare(name, contract, options)?);
            }
        }
        Ok(self)
    }

    /// Declare a property with an explicit contract
    pub fn property(self, name: &str, contract: TypeContract, options: PropertyOptions) -> Result<Self> {
        self.declare_property(name, Some(contract), options)
    }

    /// Adjust an inherited property, keeping its contract
    pub fn override_property(self, name: &str, options: PropertyOptions) -> Result<Self> {
        if !self.properties.iter().any(|p| p.name() == name) {
            return Err(Error::argument(format!(
                "cannot override unknown property `{name}` of `{}`",
                self.name
            )));
        }
        self.declare_property(name, None, options)
    }

    pub fn driver(mut self, driver: Arc<dyn ResourceDriver>) -> Self {
        self.driver = driver;
        self
    }

    pub fn events(mut self, events: Arc<dyn ResourceEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn build(self) -> Arc<ResourceSchema> {
        let accessors = self
            .properties
            .iter()
            .enumerate()
            .map(|(index, p)| (p.name().to_string(), (index, p.emit_accessors())))
            .collect();

        Arc::new(ResourceSchema {
            name: self.name,
            parent: self.parent,
            properties: self.properties,
            accessors,
            driver: self.driver,
            events: self.events,
        })
    }
}
