//! Error types for Tessera

use thiserror::Error;

/// The main error type for Tessera operations
#[derive(Debug, Error)]
pub enum TesseraError {
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Duplicate entity name: {0}")]
    DuplicateEntityName(String),

    #[error("State '{state}' not found in layer {layer}")]
    StateNotFound { state: String, layer: usize },

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Animator has no controller assigned")]
    NoController,

    #[error("Clip not found: {0}")]
    ClipNotFound(String),

    #[error("Invalid field type: expected {expected}, got {got}")]
    InvalidFieldType { expected: String, got: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Import error: {0}")]
    ImportError(String),

    #[error("Animation error: {0}")]
    AnimationError(String),
}

/// Result type alias for Tessera operations
pub type Result<T> = std::result::Result<T, TesseraError>;

impl From<toml::de::Error> for TesseraError {
    fn from(err: toml::de::Error) -> Self {
        TesseraError::TomlParseError(err.to_string())
    }
}
