//! Central error handling for the mapforge engine.
//!
//! Provides a unified RenderError enum with consistent categorization
//! across batching, upload and draw paths.

/// Centralized error type for all engine operations
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// A draw entry point was invoked on a batch category that does not
    /// implement it. Programmer error, never silently dropped.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A caller contract was violated (e.g. `finish` called twice).
    #[error("Precondition: {0}")]
    Precondition(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl RenderError {
    /// Convenience constructors for common error types
    pub fn unsupported<T: ToString>(msg: T) -> Self {
        RenderError::Unsupported(msg.to_string())
    }

    pub fn precondition<T: ToString>(msg: T) -> Self {
        RenderError::Precondition(msg.to_string())
    }

    pub fn upload<T: ToString>(msg: T) -> Self {
        RenderError::Upload(msg.to_string())
    }

    pub fn render<T: ToString>(msg: T) -> Self {
        RenderError::Render(msg.to_string())
    }
}

/// Result type alias for engine operations
pub type RenderResult<T> = Result<T, RenderError>;
