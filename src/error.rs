//! Error types
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading profiles or running a grid
#[derive(Error, Debug)]
pub enum Error {
    /// A required profile stream does not exist
    #[error("missing input: {}", path.display())]
    MissingInput {
        /// Location that was looked up
        path: PathBuf,
    },

    /// Stream can not be reshaped, or U and V disagree in shape
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Tolerance must be finite and positive
    #[error("invalid tolerance {0}, must be finite and > 0")]
    InvalidTolerance(f64),

    /// Configuration axes are empty or contain non-finite values
    #[error("invalid axes: {0}")]
    InvalidAxes(String),

    /// Inconsistent run configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be deserialized
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Csv output failed
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
