//! Error types for the pixel data model
use thiserror::Error;

use crate::panel::Location;

/// Data model errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed construction input (layout line, panel size, pixel state)
    #[error("{}", validation_message(.line, .message))]
    Validation {
        /// 1-based line number when the input came from a layout file
        line: Option<usize>,
        message: String,
    },

    /// No pixel at the requested location
    #[error("No pixel at {0}")]
    NotFound(Location),

    /// Spatial query against a panel without pixels
    #[error("Panel is empty")]
    EmptyPanel,

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn validation_message(line: &Option<usize>, message: &str) -> String {
    match line {
        Some(line) => format!("Invalid input on line {}: {}", line, message),
        None => format!("Invalid input: {}", message),
    }
}

impl CoreError {
    /// Creates a validation error not tied to a file line.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            line: None,
            message: message.into(),
        }
    }

    /// Creates a validation error for a line of a layout file.
    pub fn at_line(line: usize, message: impl Into<String>) -> Self {
        Self::Validation {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Attaches a line number to a validation error that has none.
    pub fn with_line(self, line: usize) -> Self {
        match self {
            Self::Validation {
                line: None,
                message,
            } => Self::Validation {
                line: Some(line),
                message,
            },
            other => other,
        }
    }
}

/// Result type for data model operations
pub type Result<T> = std::result::Result<T, CoreError>;
