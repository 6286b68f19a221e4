//! Error types for the declarative resource model
//!
//! None of these are caught inside the crate. They propagate to whoever
//! called the mutating, reading or converging operation.

use crate::value::Value;
use thiserror::Error;

/// Errors that can occur while declaring, populating or converging resources
#[derive(Error, Debug)]
pub enum Error {
    /// A value failed a type contract check (nullability, kind, predicate)
    #[error("{message} (got {value})")]
    Validation { message: String, value: Value },

    /// The operation is not allowed in the resource's current lifecycle state
    #[error("{resource}: {message}")]
    ResourceState { message: String, resource: String },

    /// The property has been frozen by the resource's lifecycle
    #[error("{resource}: cannot change `{property}`: {message}")]
    PropertyDefined {
        message: String,
        resource: String,
        property: String,
    },

    /// Malformed open or schema declaration call
    #[error("{0}")]
    Argument(String),

    /// Loading the actual state failed; replayed on every later access
    #[error("{resource}: failed to load current state: {message}")]
    Load { resource: String, message: String },

    /// The apply step of a convergence failed
    #[error("{resource}: apply failed: {message}")]
    Apply { resource: String, message: String },

    /// Failure raised from user code (lazy bodies, predicates, drivers)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>, value: &Value) -> Self {
        Self::Validation {
            message: message.into(),
            value: value.clone(),
        }
    }

    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    /// Prefix a validation message with the property it was raised for
    pub(crate) fn for_property(self, property: &str) -> Self {
        match self {
            Self::Validation { message, value } => Self::Validation {
                message: format!("property `{property}` {message}"),
                value,
            },
            other => other,
        }
    }

    /// Whether this is a contract failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Whether this is a lifecycle state failure
    pub fn is_resource_state(&self) -> bool {
        matches!(self, Self::ResourceState { .. })
    }

    /// Whether this is a frozen-property failure
    pub fn is_property_defined(&self) -> bool {
        matches!(self, Self::PropertyDefined { .. })
    }

    /// Whether this is a malformed call
    pub fn is_argument(&self) -> bool {
        matches!(self, Self::Argument(_))
    }
}

/// Result type for declarative operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_includes_value() {
        let err = Error::validation("must not be null", &Value::Null);
        assert_eq!(err.to_string(), "must not be null (got null)");
        assert!(err.is_validation());
    }

    #[test]
    fn test_for_property_prefixes_validation_only() {
        let err = Error::validation("must be a `integer`", &Value::from("x")).for_property("mode");
        assert!(err.to_string().starts_with("property `mode` must be"));

        let err = Error::argument("too many arguments").for_property("mode");
        assert_eq!(err.to_string(), "too many arguments");
    }

    #[test]
    fn test_property_defined_display() {
        let err = Error::PropertyDefined {
            message: "identity is already defined".into(),
            resource: "person[5]".into(),
            property: "id".into(),
        };
        assert_eq!(
            err.to_string(),
            "person[5]: cannot change `id`: identity is already defined"
        );
    }
}
