//! Error types for Visage
//!
//! The animation core itself never fails: bad inputs are clamped or ignored.
//! These errors only surface at the edges (configuration, strict lookups).

use thiserror::Error;

/// Visage errors
#[derive(Error, Debug)]
pub enum VisageError {
    #[error("Unknown blendshape channel: {0}")]
    UnknownChannel(String),

    #[error("Unknown expression preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for Visage operations
pub type VisageResult<T> = Result<T, VisageError>;
