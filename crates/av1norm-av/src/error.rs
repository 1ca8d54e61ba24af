//! Error types for av1norm-av.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during media processing.
///
/// The three per-file failure kinds (`Probe`, `Encode`, `Replace`) carry the
/// affected path plus a diagnostic so the orchestrator can report them
/// without inspecting internals. None of them is fatal to a batch run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// Probing a file failed (tool missing, non-zero exit, or bad output).
    #[error("probe failed: {}: {message}", path.display())]
    Probe { path: PathBuf, message: String },

    /// The external encoder failed during a transcode.
    #[error("encode failed: {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },

    /// A filesystem step of the transactional swap failed.
    #[error("replace failed: {}: {message}", path.display())]
    Replace { path: PathBuf, message: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a probe failure.
    pub fn probe(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Probe {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an encode failure.
    pub fn encode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Encode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a replace failure.
    pub fn replace(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Replace {
            path: path.into(),
            message: message.into(),
        }
    }
}
