use thiserror::Error;

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while building a schema or encoding a specifier.
///
/// All of these are caller errors: the specifier has the wrong shape for the
/// schema, or the schema itself was declared inconsistently. None of them are
/// worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema `{schema}` expects {expected} specifier values, got {got}")]
    Arity {
        schema: String,
        expected: usize,
        got: usize,
    },

    #[error("schema `{schema}` cannot encode specifier: {reason}")]
    Encoding { schema: String, reason: String },

    #[error("invalid schema `{schema}`: {reason}")]
    Definition { schema: String, reason: String },
}

impl SchemaError {
    pub(crate) fn encoding(schema: &str, reason: impl Into<String>) -> Self {
        SchemaError::Encoding {
            schema: schema.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn definition(schema: &str, reason: impl Into<String>) -> Self {
        SchemaError::Definition {
            schema: schema.to_string(),
            reason: reason.into(),
        }
    }
}
