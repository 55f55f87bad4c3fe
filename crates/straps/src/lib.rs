//! Straps: class composition on delegating objects
//!
//! This crate provides a small composition engine:
//! - **Injection**: merge a field source into an object, linking replaced
//!   methods and synthesizing `getX`/`setX` bean accessors (`inject` module)
//! - **Classes**: derive classes whose instances delegate to a template and
//!   whose statics are copied down the hierarchy (`class` module)
//! - **Iteration and helpers**: `each`, `merge`, `clone_object`, `pick`
//!
//! Everything lives in a [`Realm`], an arena of objects, native functions
//! and classes.
//!
//! # Example
//!
//! ```rust,ignore
//! use straps::{FieldSource, Realm, Value};
//!
//! let mut realm = Realm::new();
//! let get_width = realm.define_function("getWidth", 0, |realm, inv| {
//!     let this = inv.this.as_object().unwrap();
//!     realm.get(this, "_width")
//! });
//! let shape = realm.extend(realm.base_class(), &[
//!     FieldSource::new().field("_width", 3).field("getWidth", get_width),
//! ])?;
//! let instance = realm.construct(shape, vec![])?;
//! assert_eq!(realm.get(instance, "width")?, Value::Number(3.0));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Object model
// ============================================================================

pub mod error;
pub mod function;
pub mod object;
pub mod options;
pub mod realm;
pub mod value;

// ============================================================================
// Composition
// ============================================================================

pub mod class;
pub mod each;
pub mod inject;
pub mod source;
pub mod utils;

// ============================================================================
// Re-exports
// ============================================================================

pub use class::{Class, ClassRegistry};
pub use each::EachKey;
pub use error::{StrapsError, StrapsResult};
pub use function::{Function, Invocation, Method, NativeFn, OverrideLink};
pub use inject::InjectMode;
pub use object::{Object, PropertyDescriptor, Slot};
pub use options::RealmOptions;
pub use realm::Realm;
pub use source::{Field, FieldSource, Statics};
pub use utils::{pick, pick_first};
pub use value::{ClassId, FunctionId, ObjectId, Value};
