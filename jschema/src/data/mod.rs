//! Form data bound to a normalized schema.
//!
//! - [`initial`] - initial values from existing data, defaults and types
//! - [`item`] - field views consumed by a rendering layer
//! - [`manager`] - [`SchemaManager`], the owner of the schema/data pair

/// Initial values for fields.
pub mod initial;

/// Field views and value coercion.
pub mod item;

/// The schema manager.
pub mod manager;

pub use initial::{empty_value, initial_value};
pub use item::{ENUM_PLACEHOLDER, EnumField, EnumOption, FieldKind, FormField};
pub use manager::{ChangeListener, SchemaManager};
