use jsonschema::{Draft, Validator};
use log::error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SchemaError};

/// JSON Schema dialect used to compile schemas.
///
/// Legacy (pydantic v1) task schemas are draft-07, current ones 2020-12.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SchemaDraft {
    #[serde(rename = "draft7")]
    Draft7,
    #[default]
    #[serde(rename = "draft2020-12")]
    Draft202012,
}

impl From<SchemaDraft> for Draft {
    fn from(draft: SchemaDraft) -> Self {
        match draft {
            SchemaDraft::Draft7 => Draft::Draft7,
            SchemaDraft::Draft202012 => Draft::Draft202012,
        }
    }
}

/// Compiles schemas and validates data against the loaded one.
pub struct SchemaValidator {
    draft: SchemaDraft,
    all_errors: bool,
    validator: Option<Validator>,
}

impl SchemaValidator {
    /// With `all_errors` unset, [`errors`](Self::errors) stops at the first
    /// error.
    pub fn new(draft: SchemaDraft, all_errors: bool) -> Self {
        SchemaValidator {
            draft,
            all_errors,
            validator: None,
        }
    }

    pub fn draft(&self) -> SchemaDraft {
        self.draft
    }

    /// Compile `schema`. Returns `false` (and logs why) when the document is
    /// not a well-formed schema.
    pub fn load_schema(&mut self, schema: &Value) -> bool {
        match self.try_load_schema(schema) {
            Ok(()) => true,
            Err(err) => {
                error!("SchemaValidator: error compiling schema: {err}");
                false
            }
        }
    }

    /// Compile `schema`, reporting a malformed document as
    /// [`SchemaError::InvalidSchema`].
    pub fn try_load_schema(&mut self, schema: &Value) -> Result<()> {
        self.validator = None;
        let validator = jsonschema::options()
            .with_draft(self.draft.into())
            .build(schema)
            .map_err(|err| SchemaError::InvalidSchema(err.to_string()))?;
        self.validator = Some(validator);
        Ok(())
    }

    /// Whether a schema has been loaded successfully.
    pub fn can_validate(&self) -> bool {
        self.validator.is_some()
    }

    /// `None` until a schema has been loaded.
    pub fn is_valid(&self, data: &Value) -> Option<bool> {
        Some(self.validator.as_ref()?.is_valid(data))
    }

    /// Validation messages for `data`; empty when valid, `None` until a
    /// schema has been loaded.
    pub fn errors(&self, data: &Value) -> Option<Vec<String>> {
        let validator = self.validator.as_ref()?;
        let messages = validator.iter_errors(data).map(|err| err.to_string());
        Some(if self.all_errors {
            messages.collect()
        } else {
            messages.take(1).collect()
        })
    }
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("draft", &self.draft)
            .field("all_errors", &self.all_errors)
            .field("can_validate", &self.can_validate())
            .finish()
    }
}
