use thiserror::Error;

/// Errors produced while building or parsing paths and names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path must contain at least one segment")]
    Empty,

    #[error("path segment {index} is empty")]
    EmptySegment { index: usize },

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },
}
