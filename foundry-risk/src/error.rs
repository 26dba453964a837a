//! Error types for the risk crate.

use thiserror::Error;

/// Top-level risk crate error.
#[derive(Debug, Error)]
pub enum FoundryError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("drift error: {0}")]
    Drift(#[from] DriftError),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors from opt-in strict validation of compliance gaps.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("gap '{id}' has confidence {value} outside [0, 1]")]
    ConfidenceOutOfRange { id: String, value: f64 },
    #[error("gap '{id}' has unknown severity '{value}'")]
    UnknownSeverity { id: String, value: String },
}

/// Errors from drift baseline fitting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriftError {
    #[error("cannot fit a drift baseline from zero samples")]
    EmptyBaseline,
}
