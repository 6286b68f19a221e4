//! # Declarative
//!
//! A typed, declarative resource model.
//!
//! A resource type is declared once as a [`ResourceSchema`] of named, typed
//! properties. Opening a resource against the schema yields a [`Resource`]
//! holding the *desired* values. Its *actual* values are discovered lazily,
//! at most once, through the schema's [`ResourceDriver`], and convergence
//! applies only the properties that differ.
//!
//! ## Core Concepts
//!
//! - **TypeContract**: nullability, accepted kinds, predicates and coercion
//! - **Property**: a named slot with identity/required/default/loader metadata
//! - **ResourceSchema**: ordered properties plus inheritance by copy
//! - **LazyValue**: a deferred value with an explicit evaluation context
//! - **Resource**: desired values, a forward-only lifecycle, and the loaded
//!   actual counterpart
//! - **converge**: diff, skip or apply, and report
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{PropertyOptions, ResourceSchema, TypeContract, Value};
//!
//! let person = ResourceSchema::builder("person")
//!     .property("id", TypeContract::integer(), PropertyOptions::new().identity())?
//!     .property("name", TypeContract::text(), PropertyOptions::new().default("unknown"))?
//!     .build();
//!
//! let mut ann = person.open_positional(vec![5.into()])?;
//! ann.set("name", "Ann")?;
//!
//! if let Some(changes) = ann.converge(&[], |changes| {
//!     println!("{}", changes.description().join("\n"));
//!     Ok(())
//! })? {
//!     assert_eq!(changes.names(), vec!["name"]);
//! }
//! ```
//!
//! ## Provider Traits
//!
//! - [`ResourceDriver`]: loads and applies the real-world state
//! - [`ResourceEvents`]: receives lifecycle and convergence notifications
//!
//! The core renders nothing itself; [`LogEvents`] forwards to the `log`
//! facade and is the default.

pub mod contract;
pub mod converge;
pub mod diff;
pub mod driver;
pub mod error;
pub mod events;
pub mod lazy;
pub mod property;
pub mod resource;
pub mod schema;
mod snapshot;
pub mod types;
pub mod value;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use contract::{Coercion, Nullable, Predicate, TypeContract};
pub use converge::{converge, outcome};
pub use diff::{ChangeSet, PropertyChange, diff};
pub use driver::{NoDriver, ResourceDriver};
pub use error::{Error, Result};
pub use events::{LogEvents, NoEvents, ResourceEvents};
pub use lazy::{EvalContext, LazyValue, PropertyValue};
pub use property::{Accessors, Property, PropertyOptions, SUPPRESSED};
pub use resource::Resource;
pub use schema::{ResourceInput, ResourceSchema, SchemaBuilder};
pub use types::{ChangeAction, ConvergeSummary, LifecycleState, Outcome, SnapshotMode};
pub use value::{Kind, Value};
