//! Error types for the training engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Everything that can go wrong while building, running, training or
/// persisting a network.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("{layer}: backward called without a preceding forward pass")]
    BackwardBeforeForward { layer: String },

    #[error("{layer}: no parameter file configured")]
    ParamFileMissing { layer: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {} at line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Size mismatch loading {}: {what} expected {expected}, got {actual}", path.display())]
    LoadSizeMismatch {
        path: PathBuf,
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dataset is empty")]
    EmptyDataset,
}

impl NetworkError {
    pub(crate) fn shape(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        NetworkError::ShapeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NetworkError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Fails with [`NetworkError::ShapeMismatch`] unless `actual == expected`.
pub(crate) fn check_len(context: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(NetworkError::shape(context, expected, actual))
    }
}
