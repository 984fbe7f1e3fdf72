use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the launch core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── Launch inputs ───────────────────────────────────
    #[error("Launch configuration error: {0}")]
    Configuration(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    // ── Natives ─────────────────────────────────────────
    #[error("Native extraction failed for {library}: {reason}")]
    NativeExtraction { library: String, reason: String },

    // ── Process ─────────────────────────────────────────
    #[error("A launch is already in progress for this builder")]
    LaunchInProgress,

    #[error("Java execution failed: {0}")]
    JavaExecution(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Wraps an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}
