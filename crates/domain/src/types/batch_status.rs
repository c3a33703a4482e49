//! Batch job and piece status enumerations

use serde::{Deserialize, Serialize};

/// Status of a "try the whole look" batch job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchStatus {
    /// Created, not started
    #[default]
    Idle,
    /// Pieces are being processed
    Running,
    /// Every piece settled and the job was not cancelled
    Completed,
    /// Cancellation observed between pieces
    Cancelled,
    /// Precondition violated; no piece was started
    Failed,
}

impl BatchStatus {
    /// Check if this is a terminal state (no further transitions expected)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Check if the job is actively running
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Completed => write!(f, "Completed"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Status of a single piece within a batch job.
///
/// Progresses `Pending -> Processing -> {Done, Failed}`; `Pending -> Failed` is
/// allowed only when the job is cancelled before the piece starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PieceStatus {
    #[default]
    Pending,
    Processing,
    Done,
    Failed,
}

impl PieceStatus {
    /// A settled piece has a recorded outcome
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for PieceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
