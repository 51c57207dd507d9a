use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    schema::{IGNORED_V1, IGNORED_V2},
    validator::SchemaDraft,
};

/// How a schema is prepared before a form is built from it.
///
/// ```toml
/// ignored_properties = ["zarr_url", "zarr_urls", "init_args", "zarr_dir"]
/// draft = "draft2020-12"
/// validate_schema = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FormOptions {
    /// Top-level properties removed from the schema before building the form.
    pub ignored_properties: Vec<String>,
    /// JSON Schema draft used when compiling the schema.
    pub draft: SchemaDraft,
    /// Compile the schema with the validator before building the form.
    pub validate_schema: bool,
}

impl FormOptions {
    /// Options for legacy (v1) task argument schemas.
    pub fn legacy() -> Self {
        FormOptions {
            ignored_properties: IGNORED_V1.iter().map(|s| s.to_string()).collect(),
            draft: SchemaDraft::Draft7,
            validate_schema: true,
        }
    }

    /// Options for v2 task argument schemas.
    pub fn v2() -> Self {
        FormOptions {
            ignored_properties: IGNORED_V2.iter().map(|s| s.to_string()).collect(),
            draft: SchemaDraft::Draft202012,
            validate_schema: true,
        }
    }
}
