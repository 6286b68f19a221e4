//! Property descriptors - named, typed slots of a schema
//!
//! A [`Property`] owns its contract plus identity/required/default/loader
//! metadata and knows how to read and write its slot on a [`Resource`].
//! Reads resolve in this order:
//!
//! 1. The explicitly set (desired) value, lazies evaluated and re-coerced.
//! 2. The actual instance's value, if the resource exists and it has one.
//! 3. The loader, evaluated against the actual instance and memoized there.
//! 4. The default.

use crate::contract::{Nullable, Predicate, TypeContract};
use crate::error::{Error, Result};
use crate::lazy::{LazyValue, PropertyValue};
use crate::resource::Resource;
use crate::value::Value;

/// Rendered in place of sensitive values
pub const SUPPRESSED: &str = "(suppressed sensitive property)";

/// Read entry point for one property
pub type Reader = fn(&Property, &Resource) -> Result<Value>;

/// Write entry point for one property
pub type Writer = fn(&Property, &mut Resource, PropertyValue) -> Result<()>;

/// Read/write entry points generated for a property at declaration time
#[derive(Clone, Copy)]
pub struct Accessors {
    pub read: Reader,
    pub write: Writer,
}

impl std::fmt::Debug for Accessors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessors").finish_non_exhaustive()
    }
}

/// Options accepted when declaring (or overriding) a property
///
/// Unset options keep the inherited value when overriding.
#[derive(Debug, Clone, Default)]
pub struct PropertyOptions {
    identity: Option<bool>,
    required: Option<bool>,
    default: Option<PropertyValue>,
    loader: Option<LazyValue>,
    sensitive: Option<bool>,
    nullable: Option<Nullable>,
    predicates: Vec<Predicate>,
    description: Option<String>,
}

impl PropertyOptions {
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// Mark as part of the resource's identity
    pub fn identity(mut self) -> Self {
        self.identity = Some(true);
        self
    }

    pub fn set_identity(mut self, identity: bool) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn default(mut self, value: impl Into<PropertyValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Loader used to discover the actual value when load left it unset
    pub fn load_value(mut self, loader: LazyValue) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = Some(true);
        self
    }

    pub fn nullable(mut self, nullable: Nullable) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn must<F>(mut self, message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.predicates.push(Predicate::new(message, check));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named, typed slot in a resource schema
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    contract: TypeContract,
    identity: bool,
    required: Option<bool>,
    default: Option<PropertyValue>,
    loader: Option<LazyValue>,
    sensitive: bool,
    description: Option<String>,
}

impl Property {
    /// Declare a fresh property
    pub fn declare(
        name: impl Into<String>,
        contract: TypeContract,
        options: PropertyOptions,
    ) -> Result<Self> {
        let base = Self {
            name: name.into(),
            contract,
            identity: false,
            required: None,
            default: None,
            loader: None,
            sensitive: false,
            description: None,
        };
        base.apply(options)
    }

    /// Copy this property, then override whatever `options` sets
    pub fn derive(&self, contract: Option<TypeContract>, options: PropertyOptions) -> Result<Self> {
        let mut copy = self.clone();
        if let Some(contract) = contract {
            copy.contract = contract;
        }
        copy.apply(options)
    }

    fn apply(mut self, options: PropertyOptions) -> Result<Self> {
        if let Some(nullable) = options.nullable {
            self.contract = self.contract.nullable(nullable);
        }
        for predicate in options.predicates {
            self.contract = self.contract.with_predicate(predicate);
        }
        if let Some(identity) = options.identity {
            self.identity = identity;
        }
        if options.required.is_some() {
            self.required = options.required;
        }
        if let Some(loader) = options.loader {
            self.loader = Some(loader);
        }
        if let Some(sensitive) = options.sensitive {
            self.sensitive = sensitive;
        }
        if options.description.is_some() {
            self.description = options.description;
        }

        self.default = match options.default.or(self.default.take()) {
            Some(PropertyValue::Value(value)) => {
                let value = self.contract.coerce(value).map_err(|e| {
                    Error::argument(format!("invalid default for property `{}`: {e}", self.name))
                })?;
                Some(PropertyValue::Value(value))
            }
            other => other,
        };

        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contract(&self) -> &TypeContract {
        &self.contract
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Explicit `required`, else `identity && no default`
    pub fn is_required(&self) -> bool {
        self.required
            .unwrap_or(self.identity && self.default.is_none())
    }

    pub fn default_value_spec(&self) -> Option<&PropertyValue> {
        self.default.as_ref()
    }

    pub fn loader(&self) -> Option<&LazyValue> {
        self.loader.as_ref()
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Render a value for change descriptions
    pub fn display_value(&self, value: &Value) -> String {
        if self.sensitive {
            SUPPRESSED.to_string()
        } else {
            value.inspect()
        }
    }

    /// Pick the read/write entry points for this property
    pub fn emit_accessors(&self) -> Accessors {
        if self.identity {
            Accessors {
                read: read_identity,
                write: write_identity,
            }
        } else {
            Accessors {
                read: read_state,
                write: write_state,
            }
        }
    }

    pub fn get(&self, resource: &Resource) -> Result<Value> {
        (self.emit_accessors().read)(self, resource)
    }

    pub fn set(&self, resource: &mut Resource, value: PropertyValue) -> Result<()> {
        (self.emit_accessors().write)(self, resource, value)
    }

    pub fn coerce(&self, value: Value) -> Result<Value> {
        self.contract
            .coerce(value)
            .map_err(|e| e.for_property(&self.name))
    }

    /// Delazify a stored slot and re-coerce the result
    pub(crate) fn coerce_for_read(&self, resource: &Resource, stored: PropertyValue) -> Result<Value> {
        match stored {
            PropertyValue::Value(value) => Ok(value),
            PropertyValue::Lazy(lazy) => self.coerce(lazy.evaluate(resource, resource)?),
        }
    }

    /// Resolve the value ignoring anything explicitly set on `resource`
    pub fn current_value(&self, resource: &Resource) -> Result<Value> {
        if let Some(actual) = resource.actual_instance()? {
            if let Some(stored) = actual.explicit_value(&self.name) {
                return self.coerce_for_read(actual, stored);
            }

            if let Some(loader) = &self.loader {
                log::trace!("{resource}: loading `{}`", self.name);
                let loaded = loader
                    .evaluate(actual, resource)
                    .and_then(|value| self.coerce(value));
                return match loaded {
                    Ok(value) => {
                        actual.memoize(&self.name, value.clone());
                        Ok(value)
                    }
                    Err(e) => {
                        // Null placeholder so the loader is never invoked again
                        actual.memoize(&self.name, Value::Null);
                        Err(e)
                    }
                };
            }
        }

        self.default_value(resource)
    }

    /// Evaluate the default against `resource`; null when there is none
    pub fn default_value(&self, resource: &Resource) -> Result<Value> {
        match &self.default {
            None => Ok(Value::Null),
            Some(PropertyValue::Value(value)) => Ok(value.clone()),
            Some(PropertyValue::Lazy(lazy)) => self.coerce(lazy.evaluate(resource, resource)?),
        }
    }

    fn store(&self, resource: &mut Resource, value: PropertyValue) -> Result<()> {
        let value = match value {
            PropertyValue::Value(value) => PropertyValue::Value(self.coerce(value)?),
            lazy @ PropertyValue::Lazy(_) => lazy,
        };
        resource.store(&self.name, value);
        Ok(())
    }
}

fn read_identity(property: &Property, resource: &Resource) -> Result<Value> {
    match resource.explicit_value(property.name()) {
        Some(stored) => property.coerce_for_read(resource, stored),
        None => property.default_value(resource),
    }
}

fn read_state(property: &Property, resource: &Resource) -> Result<Value> {
    resource.ensure_state_readable(property)?;
    match resource.explicit_value(property.name()) {
        Some(stored) => property.coerce_for_read(resource, stored),
        None => property.current_value(resource),
    }
}

fn write_identity(property: &Property, resource: &mut Resource, value: PropertyValue) -> Result<()> {
    resource.ensure_identity_writable(property)?;
    property.store(resource, value)
}

fn write_state(property: &Property, resource: &mut Resource, value: PropertyValue) -> Result<()> {
    resource.ensure_state_writable(property)?;
    property.store(resource, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_defaults_to_identity_without_default() {
        let id = Property::declare("id", TypeContract::integer(), PropertyOptions::new().identity())
            .unwrap();
        assert!(id.is_required());

        let named = Property::declare(
            "name",
            TypeContract::text(),
            PropertyOptions::new().identity().default("x"),
        )
        .unwrap();
        assert!(!named.is_required());

        let plain = Property::declare("mode", TypeContract::integer(), PropertyOptions::new()).unwrap();
        assert!(!plain.is_required());
    }

    #[test]
    fn test_invalid_default_is_argument_error() {
        let err = Property::declare(
            "x",
            TypeContract::integer(),
            PropertyOptions::new().default("ten"),
        )
        .unwrap_err();
        assert!(err.is_argument());
        assert!(err.to_string().contains("invalid default for property `x`"));
    }

    #[test]
    fn test_default_is_coerced_at_declaration() {
        let p = Property::declare("x", TypeContract::integer(), PropertyOptions::new().default("10"))
            .unwrap();
        assert_eq!(p.default_value_spec().and_then(PropertyValue::as_value), Some(&Value::Integer(10)));
    }

    #[test]
    fn test_derive_overrides_only_given_options() {
        let base = Property::declare(
            "mode",
            TypeContract::integer(),
            PropertyOptions::new().default(0o644).description("permission bits"),
        )
        .unwrap();

        let derived = base
            .derive(None, PropertyOptions::new().default(0o600).sensitive())
            .unwrap();
        assert_eq!(derived.description(), Some("permission bits"));
        assert!(derived.is_sensitive());
        assert_eq!(
            derived.default_value_spec().and_then(PropertyValue::as_value),
            Some(&Value::Integer(0o600))
        );
        // The base is untouched
        assert!(!base.is_sensitive());
        assert_eq!(
            base.default_value_spec().and_then(PropertyValue::as_value),
            Some(&Value::Integer(0o644))
        );
    }

    #[test]
    fn test_derive_appends_predicates() {
        let base = Property::declare(
            "port",
            TypeContract::integer(),
            PropertyOptions::new().must("must be positive", |v| v.as_i64().is_some_and(|n| n > 0)),
        )
        .unwrap();
        let derived = base
            .derive(None, PropertyOptions::new().must("must be unprivileged", |v| {
                v.as_i64().is_some_and(|n| n >= 1024)
            }))
            .unwrap();

        assert_eq!(derived.contract().predicates().len(), 2);
        assert!(derived.coerce(Value::from(80)).is_err());
        assert!(base.coerce(Value::from(80)).is_ok());
    }

    #[test]
    fn test_sensitive_display() {
        let secret = Property::declare(
            "password",
            TypeContract::text(),
            PropertyOptions::new().sensitive(),
        )
        .unwrap();
        assert_eq!(secret.display_value(&Value::from("hunter2")), SUPPRESSED);

        let plain = Property::declare("user", TypeContract::text(), PropertyOptions::new()).unwrap();
        assert_eq!(plain.display_value(&Value::from("ann")), "\"ann\"");
    }
}
