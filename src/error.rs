// src/error.rs
// =============================================================================
// Error types for the parts of the program that are allowed to fail.
//
// Individual rows never fail: a bad URL or a dead network becomes an
// availability code (see resolver::outcome). What CAN fail is everything
// around the batch: reading the input file, finding the URL column,
// writing the output file, building the HTTP clients.
//
// Rust concepts:
// - thiserror: derive macro that writes the Display and Error impls for us
// - #[from]: lets the ? operator convert library errors automatically
// =============================================================================

use thiserror::Error;

/// Result type alias for fallible batch-level operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Everything that can abort a batch before or after it runs.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed (input unreadable, output unwritable)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP clients could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The designated URL column is not in the input header
    #[error("Column '{column}' not found in input. Available: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// The input file has no header row
    #[error("Input has no header row")]
    EmptyInput,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a missing-column error from the header we actually found.
    pub fn missing_column(column: impl Into<String>, available: &[String]) -> Self {
        Self::MissingColumn {
            column: column.into(),
            available: available.to_vec(),
        }
    }
}
