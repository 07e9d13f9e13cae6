use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeafLensError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Analysis provider error: {0}")]
    Provider(String),

    #[error("Malformed analysis payload: {0}")]
    MalformedPayload(String),

    #[error("Overlay error: {0}")]
    Overlay(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Coarse classification carried in the session's failed state so a front end
/// can pick the right retry affordance without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedFileType,
    Transport,
    Provider,
    MalformedPayload,
    Other,
}

impl LeafLensError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFileType(_) => ErrorKind::UnsupportedFileType,
            Self::Http(_) => ErrorKind::Transport,
            Self::Provider(_) => ErrorKind::Provider,
            Self::MalformedPayload(_) => ErrorKind::MalformedPayload,
            _ => ErrorKind::Other,
        }
    }
}

pub type LeafLensResult<T> = Result<T, LeafLensError>;
