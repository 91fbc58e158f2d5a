//! Error types for the labyrinth crate

use thiserror::Error;

use crate::env::{Action, Position};

/// Main error type for the labyrinth crate
///
/// None of these are transient: they describe a misconfigured agent, a malformed map,
/// or a caller that stepped outside the legal action set. Nothing is retried.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    #[error("position {position:?} is outside the grid")]
    OutOfBounds { position: Position },

    #[error("action `{action}` is not legal from {position:?}")]
    IllegalAction { position: Position, action: Action },

    #[error("no reward defined for cell code {code} at {position:?}")]
    UndefinedReward { position: Position, code: i32 },

    #[error("no legal action available from {position:?}")]
    NoLegalAction { position: Position },

    #[error("model mismatch: {message}")]
    ModelMismatch { message: String },

    #[error("invalid cell value '{value}' at line {line}, column {column}")]
    InvalidCell {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("grid has no cells")]
    EmptyGrid,

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("grid parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        Error::ModelMismatch {
            message: message.into(),
        }
    }

    pub(crate) fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type alias for labyrinth operations
pub type Result<T> = std::result::Result<T, Error>;
