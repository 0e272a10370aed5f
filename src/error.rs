/// Error types shared by the data layer, the pipeline and the session.

use std::io;

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The processor catalog is missing, malformed or incomplete.
    #[error("processor catalog error: {0}")]
    Catalog(String),

    #[error("unknown processor `{0}`")]
    UnknownProcessor(String),

    #[error("unknown processing step `{0}`")]
    UnknownStep(String),

    #[error("step `{step}` has no parameter `{param}`")]
    UnknownParam { step: String, param: String },

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("invalid argument `{name}` for `{action}`: {reason}")]
    InvalidArgument {
        action: String,
        name: String,
        reason: String,
    },

    #[error("parameter `{0}` is read-only")]
    ReadOnly(String),

    #[error("step `{0}` cannot be removed")]
    NotRemovable(String),

    #[error("invalid span `{0}`")]
    InvalidSpan(String),

    #[error("span {low}..{high} lies outside the {axis} axis")]
    SpanOutOfRange { low: f64, high: f64, axis: String },

    #[error("region `{0}` not found")]
    RegionNotFound(String),

    #[error("dataset `{0}` not found")]
    DatasetNotFound(String),

    #[error("subproject `{0}` not found")]
    SubprojectNotFound(String),

    #[error("no project is open")]
    NoProject,

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("parse error: {0}")]
    Parse(String),
}
