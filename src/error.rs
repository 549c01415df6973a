//! Error types for the generation lifecycle.

/// Errors that can occur while validating, generating, or persisting images.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// No API key was entered.
    #[error("Please enter your Together.AI API key")]
    MissingCredential,

    /// The prompt was blank.
    #[error("Please enter a prompt describing the image you want to create")]
    EmptyPrompt,

    /// Steps fell outside the supported range.
    #[error("Steps must be between {min} and {max}, got {steps}")]
    StepsOutOfRange {
        /// Steps requested.
        steps: u32,
        /// Lowest accepted value.
        min: u32,
        /// Highest accepted value.
        max: u32,
    },

    /// Width or height is not one of the supported dimensions.
    #[error("Unsupported image dimensions {width}x{height}")]
    UnsupportedDimension {
        /// Width requested.
        width: u32,
        /// Height requested.
        height: u32,
    },

    /// API returned a non-success status.
    #[error("{message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or a status fallback.
        message: String,
    },

    /// API returned success but no image URL.
    #[error("Invalid response from API")]
    MalformedResponse,

    /// Network or HTTP transport failure.
    #[error("Network error, check your connection: {0}")]
    Transport(#[from] reqwest::Error),

    /// I/O error (e.g., saving a file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Durable storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// Clipboard write failed.
    #[error("clipboard error: {0}")]
    Clipboard(String),
}

impl StudioError {
    /// Returns true if this error was raised locally before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential
                | Self::EmptyPrompt
                | Self::StepsOutOfRange { .. }
                | Self::UnsupportedDimension { .. }
        )
    }

    /// Returns the HTTP status for remote failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;
