//! Type contracts - coercion and validation rules for a single value
//!
//! A [`TypeContract`] validates in a fixed order:
//!
//! 1. Nullability: a null value either passes immediately, fails, or goes on
//!    to the remaining checks, depending on [`Nullable`].
//! 2. Kind: the value must carry one of the required [`Kind`]s.
//! 3. Predicates, in declaration order; the first failing one wins.
//!
//! Concrete contracts (`integer`, `text`, `path`, `timestamp`, ...) normalize
//! the representation first and then delegate to validation.

use crate::error::{Error, Result};
use crate::value::{Kind, Value};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt;
use std::path::{Component, PathBuf};
use std::sync::Arc;

/// How a contract treats null
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nullable {
    /// Null is always accepted, no further checks
    #[default]
    Allowed,
    /// Null is rejected
    Forbidden,
    /// Null goes through the kind and predicate checks like any other value
    Validate,
}

type Check = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
type Normalizer = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// A named validation rule
#[derive(Clone)]
pub struct Predicate {
    message: String,
    check: Check,
}

impl Predicate {
    pub fn new<F>(message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            check: Arc::new(check),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn holds(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Representation normalization applied before validation
#[derive(Clone, Default)]
pub enum Coercion {
    #[default]
    Identity,
    Boolean,
    Integer,
    Float,
    Text,
    Path,
    Timestamp,
    Custom(Normalizer),
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identity => "Identity",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Text => "Text",
            Self::Path => "Path",
            Self::Timestamp => "Timestamp",
            Self::Custom(_) => "Custom",
        };
        f.write_str(name)
    }
}

/// 2^63; whole floats in `-2^63..2^63` convert to `i64` exactly
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl Coercion {
    /// Normalize a non-null value; `None` leaves it untouched
    fn normalize(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (_, Value::Null) | (Self::Identity, _) => None,
            (Self::Boolean, Value::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(Value::Bool(true)),
                "false" | "no" | "off" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            (Self::Integer, Value::Text(s)) => s.trim().parse::<i64>().ok().map(Value::Integer),
            (Self::Integer, Value::Float(n))
                if n.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(n) =>
            {
                Some(Value::Integer(*n as i64))
            }
            (Self::Float, Value::Integer(n)) => Some(Value::Float(*n as f64)),
            (Self::Float, Value::Text(s)) => s.trim().parse::<f64>().ok().map(Value::Float),
            (Self::Text, Value::Bool(_) | Value::Integer(_) | Value::Float(_) | Value::Path(_)) => {
                Some(Value::Text(value.to_string()))
            }
            (Self::Path, Value::Text(s)) => Some(Value::Path(clean_path(&PathBuf::from(s)))),
            (Self::Path, Value::Path(p)) => Some(Value::Path(clean_path(p))),
            (Self::Timestamp, Value::Text(s)) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|t| Value::Timestamp(t.with_timezone(&Utc))),
            (Self::Timestamp, Value::Integer(secs)) => {
                DateTime::<Utc>::from_timestamp(*secs, 0).map(Value::Timestamp)
            }
            (Self::Custom(normalize), v) => normalize(v),
            _ => None,
        }
    }
}

/// Drop `.` components so `/a/./b` and `/a/b` compare equal
fn clean_path(path: &std::path::Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Coercion and validation rule for a single value
#[derive(Debug, Clone, Default)]
pub struct TypeContract {
    nullable: Nullable,
    kinds: Vec<Kind>,
    predicates: Vec<Predicate>,
    coercion: Coercion,
}

impl TypeContract {
    /// Accepts anything
    pub fn any() -> Self {
        Self::default()
    }

    fn of(kind: Kind, coercion: Coercion) -> Self {
        Self {
            kinds: vec![kind],
            coercion,
            ..Self::default()
        }
    }

    pub fn boolean() -> Self {
        Self::of(Kind::Bool, Coercion::Boolean)
    }

    pub fn integer() -> Self {
        Self::of(Kind::Integer, Coercion::Integer)
    }

    pub fn float() -> Self {
        Self::of(Kind::Float, Coercion::Float)
    }

    pub fn text() -> Self {
        Self::of(Kind::Text, Coercion::Text)
    }

    pub fn path() -> Self {
        Self::of(Kind::Path, Coercion::Path)
    }

    pub fn timestamp() -> Self {
        Self::of(Kind::Timestamp, Coercion::Timestamp)
    }

    pub fn list() -> Self {
        Self::of(Kind::List, Coercion::Identity)
    }

    pub fn map() -> Self {
        Self::of(Kind::Map, Coercion::Identity)
    }

    pub fn nullable(mut self, nullable: Nullable) -> Self {
        self.nullable = nullable;
        self
    }

    /// Shorthand for `nullable(Nullable::Forbidden)`
    pub fn non_null(self) -> Self {
        self.nullable(Nullable::Forbidden)
    }

    /// Accept an additional kind
    pub fn or_kind(mut self, kind: Kind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Replace the normalization step with a custom one
    pub fn with_coercion<F>(mut self, normalize: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.coercion = Coercion::Custom(Arc::new(normalize));
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn must<F>(self, message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.with_predicate(Predicate::new(message, check))
    }

    /// Text (or path) must match the regex
    pub fn must_match(self, regex: Regex) -> Self {
        let message = format!("must match /{}/", regex.as_str());
        self.must(message, move |v| match v {
            Value::Text(s) => regex.is_match(s),
            Value::Path(p) => regex.is_match(&p.to_string_lossy()),
            _ => false,
        })
    }

    pub fn must_be_one_of(self, allowed: Vec<Value>) -> Self {
        let listed: Vec<String> = allowed.iter().map(Value::inspect).collect();
        let message = format!("must be one of {}", listed.join(", "));
        self.must(message, move |v| allowed.contains(v))
    }

    /// Numeric value within the inclusive range
    pub fn must_be_between(self, min: f64, max: f64) -> Self {
        self.must(format!("must be between {min} and {max}"), move |v| {
            v.as_f64().is_some_and(|n| (min..=max).contains(&n))
        })
    }

    /// Text, list or map must not be empty
    pub fn must_not_be_empty(self) -> Self {
        self.must("must not be empty", |v| match v {
            Value::Text(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Path(p) => !p.as_os_str().is_empty(),
            _ => true,
        })
    }

    pub fn nullability(&self) -> Nullable {
        self.nullable
    }

    pub fn kinds(&self) -> &[Kind] {
        &self.kinds
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Check a value without changing it
    pub fn validate(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            match self.nullable {
                Nullable::Allowed => return Ok(()),
                Nullable::Forbidden => return Err(Error::validation("must not be null", value)),
                Nullable::Validate => {}
            }
        }

        if !self.kinds.is_empty() && !self.kinds.contains(&value.kind()) {
            let kinds: Vec<&str> = self.kinds.iter().map(Kind::as_str).collect();
            return Err(Error::validation(
                format!("must be a `{}`", kinds.join(", ")),
                value,
            ));
        }

        match self.predicates.iter().find(|p| !p.holds(value)) {
            Some(failed) => Err(Error::validation(failed.message(), value)),
            None => Ok(()),
        }
    }

    /// Normalize the representation, then validate
    pub fn coerce(&self, value: Value) -> Result<Value> {
        let value = self.coercion.normalize(&value).unwrap_or(value);
        self.validate(&value)?;
        Ok(value)
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.coerce(value.clone()).is_ok()
    }
}
