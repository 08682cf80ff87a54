/// Error types shared by the loader and configuration layers
use std::path::PathBuf;

/// Failure to turn a packaged model file into a mesh
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed model data: {0}")]
    Malformed(String),
    #[error("unsupported model: {0}")]
    Unsupported(String),
    #[error("invalid glTF JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoadError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

/// Failure to read a viewer configuration document
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}
