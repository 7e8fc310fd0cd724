//! Upload handle returned by the remote file endpoint

use serde::{Deserialize, Serialize};

/// Whether an uploaded file can be referenced in a generation call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessState {
    /// Still being processed by the service
    Pending,
    /// Safe to reference
    Active,
    /// Processing failed; the handle is unusable
    Failed,
}

impl ReadinessState {
    /// Map the service's state string
    ///
    /// `PROCESSING`, `STATE_UNSPECIFIED` and anything unknown count as pending,
    /// so the poll bound decides when to give up on them.
    pub fn from_remote(state: &str) -> Self {
        match state.to_ascii_uppercase().as_str() {
            "ACTIVE" => Self::Active,
            "FAILED" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// Reference to a file uploaded for one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadHandle {
    /// Resource name used to poll and delete (e.g. `files/abc123`)
    pub name: String,
    /// URI referenced from the prompt
    pub uri: String,
    /// MIME type the service recorded for the file
    pub mime_type: String,
    /// Last observed readiness
    pub state: ReadinessState,
    /// Failure detail reported by the service, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadHandle {
    pub fn is_active(&self) -> bool {
        self.state == ReadinessState::Active
    }
}
