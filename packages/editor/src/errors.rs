//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] easel_common::CommonError),
}

/// Malformed schema input; construction is refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Node {id:?} has no componentName")]
    MissingComponentName { id: Option<String> },

    #[error("Node id must not be empty")]
    EmptyId,
}
