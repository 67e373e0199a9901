//! Error types shared across Matchcut crates.

use std::path::PathBuf;

/// Top-level error type for Matchcut operations.
#[derive(Debug, thiserror::Error)]
pub enum MatchcutError {
    /// The export request failed validation before any work started.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The output directory prompt was dismissed without a selection.
    #[error("Export cancelled: no output directory selected")]
    UserCancelled,

    /// An annotation data URL did not match the expected shape or failed
    /// to decode.
    #[error("Annotation decode error: {message}")]
    AnnotationDecode { message: String },

    /// Dual-angle composition was requested but no secondary source is
    /// available.
    #[error("Dual-angle export requires a secondary source")]
    DualSourceMissing,

    /// The external transcoder exited non-zero or could not be started.
    #[error("Transcoder failed{}: {message}", .code.map(|c| format!(" (exit code {c})")).unwrap_or_default())]
    ExternalProcess { code: Option<i32>, message: String },

    /// Probing a source file with ffprobe failed.
    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using MatchcutError.
pub type MatchcutResult<T> = Result<T, MatchcutError>;

impl MatchcutError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: msg.into(),
        }
    }

    pub fn annotation_decode(msg: impl Into<String>) -> Self {
        Self::AnnotationDecode {
            message: msg.into(),
        }
    }

    pub fn external_process(code: Option<i32>, msg: impl Into<String>) -> Self {
        Self::ExternalProcess {
            code,
            message: msg.into(),
        }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
