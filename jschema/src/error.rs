use thiserror::Error;

/// Errors raised while normalizing schemas or editing form data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    /// No schema was supplied to the manager.
    #[error("schema is undefined")]
    SchemaUndefined,

    /// A schema with properties was supplied without any data.
    #[error("Schema data is undefined")]
    DataUndefined,

    /// A schema position whose `$ref` could not be resolved.
    #[error("unresolved schema node at `{path}`")]
    UnresolvedNode { path: String },

    /// A `$ref` that (directly or indirectly) references itself.
    #[error("reference cycle detected while resolving `{reference}`")]
    ReferenceCycle { reference: String },

    /// The schema document is not a well-formed JSON Schema.
    #[error("invalid JSON Schema: {0}")]
    InvalidSchema(String),

    /// The form data does not satisfy the schema.
    #[error("invalid JSON Schema data: {}", errors.join("; "))]
    InvalidData { errors: Vec<String> },

    /// A value does not match the type required at `path`.
    #[error("type mismatch at `{path}`: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// No field exists at `path`.
    #[error("no field at `{path}`")]
    UnknownPath { path: String },

    /// The requested edit is not allowed for the field at `path`.
    #[error("cannot edit `{path}`: {reason}")]
    InvalidOperation { path: String, reason: String },
}

/// Result alias for schema operations.
pub type Result<T, E = SchemaError> = std::result::Result<T, E>;
