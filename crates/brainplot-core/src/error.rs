//! Error types for electrode data loading and plot styling

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or validating an electrode data file.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The data file could not be read
    #[error("Failed to read electrode data {path}: {source}")]
    Io {
        /// File that failed to open
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid electrode JSON
    #[error("Malformed electrode data: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two per-electrode arrays disagree in length
    #[error("Field `{field}` has {got} entries, expected {expected} (one per electrode)")]
    LengthMismatch {
        /// Offending field name
        field: &'static str,
        /// Entries found
        got: usize,
        /// Entries expected
        expected: usize,
    },

    /// A coordinate or t-value is NaN or infinite
    #[error("Non-finite value in `{field}` at index {index}")]
    NonFinite {
        /// Offending field name
        field: &'static str,
        /// Electrode index
        index: usize,
    },

    /// The settings list must hold exactly one mapping
    #[error("Expected exactly one settings mapping, found {0}")]
    SettingsCount(usize),
}

/// Errors raised while resolving colors, ranges and transforms.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    /// Colormap name not recognised
    #[error("Unknown colormap '{name}' (available: {available})")]
    UnknownColormap {
        /// Requested name
        name: String,
        /// Comma-separated list of known names
        available: String,
    },

    /// Logarithm base must be positive and not 1
    #[error("Invalid logarithm base {0}")]
    InvalidLogBase(f64),

    /// No range was configured and there is no data to derive one from
    #[error("Cannot derive a color range from empty data; set clip or settings vmin/vmax")]
    EmptyRange,

    /// Range bounds are reversed or not finite
    #[error("Invalid color range [{min}, {max}]")]
    InvalidRange {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Opacity outside `[0, 1]`
    #[error("Opacity {0} outside [0, 1]")]
    InvalidOpacity(f64),

    /// Marker size must be positive
    #[error("Electrode size {0} must be positive")]
    InvalidSize(f64),
}
