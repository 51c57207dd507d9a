//! # jschema
//!
//! Turns JSON Schema documents into editable form models.
//!
//! A schema is first normalized: every `$ref` is replaced by its target and
//! every `allOf` is merged into a single node. The result is parsed into a
//! typed [`Schema`] and bound to a data object by a [`SchemaManager`], which
//! initializes missing values, exposes field views, applies edits and
//! produces the final argument object.
//!
//! ## Quick Start
//!
//! ```rust
//! use jschema::{SchemaManager, Value};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "threshold": {"$ref": "#/definitions/Threshold"},
//!         "label": {"type": "string", "default": null}
//!     },
//!     "definitions": {
//!         "Threshold": {"type": "integer", "exclusiveMinimum": 0}
//!     }
//! });
//!
//! let mut manager = SchemaManager::new(Some(schema), Some(json!({}))).unwrap();
//! manager.set_value("threshold", json!("3")).unwrap();
//! assert_eq!(
//!     manager.get_arguments(),
//!     json!({"threshold": 3, "label": Value::Null})
//! );
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - reference resolution, `allOf` merging, normalization and
//!   the typed schema model
//! - [`data`] - initial values, field views and the schema manager
//! - [`validator`] - adapter over the `jsonschema` validation engine
//! - [`options`] - schema preparation options

/// Form data bound to a normalized schema.
pub mod data;

/// Error type shared by the crate.
pub mod error;

/// Schema preparation options.
pub mod options;

/// Field paths.
pub mod path;

/// Schema normalization and the typed schema model.
pub mod schema;

/// JSON value helpers.
pub mod utils;

/// JSON Schema validation.
pub mod validator;

pub use data::{FieldKind, FormField, SchemaManager};
pub use error::{Result, SchemaError};
pub use options::FormOptions;
pub use path::{FieldPath, KEY_SEPARATOR};
pub use schema::{Schema, SchemaKind, adapt_schema, merge_all_of, normalize, resolve_ref};
pub use serde_json::Value;
pub use validator::{SchemaDraft, SchemaValidator};
