use std::path::PathBuf;

use chemstore_schema::SchemaError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from specifier files and directory indices.
///
/// A node that simply does not exist yet is not an error for `exists` or
/// `existing`; [`StoreError::NodeNotFound`] only comes from reads that need
/// the node to be there.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Wrong specifier shape or an unrepresentable value.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("no node at {}", path.display())]
    NodeNotFound { path: PathBuf },

    #[error("node {} has no specifier file", path.display())]
    MissingSpecifier { path: PathBuf },

    #[error("specifier file {} is malformed: {reason}", path.display())]
    MalformedSpecifier { path: PathBuf, reason: String },

    #[error("schema `{schema}` declares no specifier file")]
    NoSpecifierFile { schema: String },

    #[error("invalid configuration {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// Filesystem failure, passed through as the OS reported it.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
