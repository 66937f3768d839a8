//! Error types for the binning pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeobinError>;

/// Every failure a pipeline stage can report.
///
/// Errors are local to the stage that detects them. The pipeline is pure, so
/// retrying an identical call always fails the same way.
#[derive(Debug, Error)]
pub enum GeobinError {
    /// A required coordinate column is not part of the record set.
    #[error("required column missing: {0}")]
    ColumnMissing(String),

    /// No record survived coordinate filtering.
    #[error("no valid points after filtering ({dropped} records dropped)")]
    EmptyInput { dropped: usize },

    /// Hex resolution outside `[0, 15]`.
    #[error("invalid hex resolution {0}, expected 0..=15")]
    InvalidResolution(u8),

    /// Malformed cell identifier (meshcode length/digits, hex string).
    #[error("format error: {0}")]
    Format(String),

    /// A mean/weight target field is absent (or not numeric) on some point.
    #[error("unknown field {field:?} on point {index}")]
    UnknownField { field: String, index: usize },

    /// Inconsistent color ramp or rendering configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "toml")]
    #[error("toml decode error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[cfg(feature = "toml")]
    #[error("toml encode error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
