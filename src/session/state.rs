use crate::analysis::types::AnalysisResponse;
use crate::errors::{ErrorKind, LeafLensError};

/// Lifecycle states of one analysis session: a single explicit value instead
/// of the loading/error/result flag combination a UI would otherwise juggle
/// into inconsistency.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    /// File bytes are being validated and decoded for the preview.
    Uploading { file_name: String },
    /// A request with this token is in flight. Responses carrying any other
    /// token belong to a superseded request and are dropped.
    Analyzing { token: u64, file_name: String },
    Success {
        token: u64,
        response: Box<AnalysisResponse>,
    },
    Failed { kind: ErrorKind, message: String },
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Failed { .. })
    }
}

/// Events driving the session state machine.
#[derive(Debug)]
pub enum SessionEvent {
    /// A file arrived from the picker or drag-and-drop surface.
    FileSelected { file_name: String, bytes: Vec<u8> },
    /// The provider finished the request carrying this token.
    AnalysisResolved {
        token: u64,
        response: Box<AnalysisResponse>,
    },
    /// The provider failed the request carrying this token.
    AnalysisRejected { token: u64, error: LeafLensError },
    /// The displayed container was (re)measured. Idempotent; the latest
    /// measurement is authoritative.
    ContainerResized { width: f64, height: f64 },
    /// "Try again": back to Idle, dropping any result or error.
    Reset,
    Shutdown,
}
