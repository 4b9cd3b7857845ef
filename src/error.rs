//! Error types for timetabler

use thiserror::Error;

/// Result type for timetabler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when building or enumerating timetables.
///
/// An enumeration that finds no viable combination is not an error; it
/// returns an empty result instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request or catalogue data, rejected before any work is done
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Day name that is neither a full English name nor an abbreviation
    #[error("Unknown day: {0}")]
    UnknownDay(String),

    /// Grid configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tabular catalogue or grid export error
    #[error("Table error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
