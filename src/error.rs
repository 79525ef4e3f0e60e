//! Error types for humlyric.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HumlyricError {
    // Capture errors
    #[error("Capture device unavailable: {message}")]
    DeviceUnavailable { message: String },

    #[error("Capture already active")]
    CaptureActive,

    // Backend exchange errors, one per wire exchange
    #[error("Transcription failed: {message}")]
    TranscriptionFailed { message: String },

    #[error("Draft generation failed: {message}")]
    GenerationFailed { message: String },

    #[error("Line regeneration failed: {message}")]
    RegenerationFailed { message: String },

    // Session misuse (e.g. generate without a transcript)
    #[error("Precondition failed: {message}")]
    PreconditionFailed { message: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl HumlyricError {
    /// Shorthand for a precondition violation with a custom message.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            message: message.into(),
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, HumlyricError>;
