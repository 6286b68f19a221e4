//! Deferred values
//!
//! A [`LazyValue`] is stored unevaluated and computed on read. How the body
//! sees the resource is fixed when the value is built, through
//! [`EvalContext`], never by inspecting the closure.

use crate::error::Result;
use crate::resource::Resource;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Which resource a lazy body is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalContext {
    /// The resource the read is performed on: for loaders this is the actual
    /// instance, for defaults and explicit values the instance being read
    Receiver,
    /// The resource the caller asked about, passed explicitly even when the
    /// read is served by the actual instance
    Argument,
}

type Body = Arc<dyn Fn(&Resource) -> Result<Value> + Send + Sync>;

/// A deferred computation with an explicit evaluation policy
///
/// Not cached: every `evaluate` runs the body again.
#[derive(Clone)]
pub struct LazyValue {
    context: EvalContext,
    body: Body,
}

impl LazyValue {
    pub fn new<F>(context: EvalContext, body: F) -> Self
    where
        F: Fn(&Resource) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            context,
            body: Arc::new(body),
        }
    }

    /// Evaluate against the instance serving the read
    pub fn receiver<F>(body: F) -> Self
    where
        F: Fn(&Resource) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(EvalContext::Receiver, body)
    }

    /// Evaluate with the requesting instance as argument
    pub fn argument<F>(body: F) -> Self
    where
        F: Fn(&Resource) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(EvalContext::Argument, body)
    }

    pub fn context(&self) -> EvalContext {
        self.context
    }

    /// Run the body, picking `receiver` or `argument` per the context
    pub fn evaluate(&self, receiver: &Resource, argument: &Resource) -> Result<Value> {
        match self.context {
            EvalContext::Receiver => (self.body)(receiver),
            EvalContext::Argument => (self.body)(argument),
        }
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyValue")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// What a property slot stores: a plain value or a deferred one
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Value(Value),
    Lazy(LazyValue),
}

impl PropertyValue {
    pub fn is_lazy(&self) -> bool {
        matches!(self, Self::Lazy(_))
    }

    /// The plain value, if not deferred
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Lazy(_) => None,
        }
    }
}

impl From<LazyValue> for PropertyValue {
    fn from(lazy: LazyValue) -> Self {
        Self::Lazy(lazy)
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

macro_rules! property_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

property_value_from!(
    &str,
    String,
    bool,
    i64,
    i32,
    u32,
    f64,
    std::path::PathBuf,
    &std::path::Path,
    chrono::DateTime<chrono::Utc>,
    Vec<Value>,
);
