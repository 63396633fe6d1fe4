use thiserror::Error;

/// Error types that can occur while building, training, sampling or persisting a model
///
/// # Variants
///
/// - `Format` - A parameter blob or file is malformed or has the wrong number of values
/// - `InvalidInput` - Input data or hyperparameters do not meet the expected shape or range
/// - `Ingestion` - A row of a training table could not be turned into a binary vector
/// - `Io` - Wraps standard I/O errors from file system operations
/// - `Json` - Wraps JSON serialization/deserialization errors
/// - `Image` - Wraps errors raised while encoding or writing an image
/// - `Config` - Wraps errors raised while parsing a TOML configuration file
#[derive(Debug, Error)]
pub enum RbmError {
    #[error("Format error: {0}")]
    Format(String),
    #[error("Input validation error: {0}")]
    InvalidInput(String),
    #[error("Ingestion error at line {line}: {reason}")]
    Ingestion { line: usize, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl RbmError {
    /// Returns `true` for the errors that must abort a run before training or sampling starts.
    pub fn is_fatal_input(&self) -> bool {
        matches!(
            self,
            RbmError::Format(_) | RbmError::Ingestion { .. } | RbmError::InvalidInput(_)
        )
    }
}
