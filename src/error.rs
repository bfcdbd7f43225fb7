//! Error types for the storage engine.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Domain error: {0}")]
    DomainError(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Corrupted file: {0}")]
    CorruptedFile(PathBuf),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

/// Alias kept for call sites that prefer the crate's own name for its error type.
pub type EngineError = StorageError;

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
