//! BatchJob entity - one "try the whole look" run
//!
//! The job owns a fixed-length array of piece states. Piece statuses only move
//! forward and the array never changes length, so a settled job always accounts
//! for every piece it was created with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::garment::GarmentSelection;
use super::generation_result::GenerationResult;
use crate::error::DomainError;
use crate::types::{BatchStatus, PieceStatus};
use crate::BatchJobId;

/// Why a piece ended up `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PieceFailureKind {
    /// Missing avatar or garment reference
    InvalidInput,
    /// Rate limit, timeout or server-side failure
    Transient,
    /// Quota exhausted, invalid image, malformed response
    Terminal,
    /// Job was cancelled before this piece started
    Cancelled,
}

/// Recorded failure for a single piece
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceFailure {
    pub kind: PieceFailureKind,
    pub message: String,
}

impl PieceFailure {
    pub fn new(kind: PieceFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(PieceFailureKind::Cancelled, "cancelled before start")
    }
}

/// State of one garment piece inside a batch job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPieceState {
    pub garment: GarmentSelection,
    pub status: PieceStatus,
    pub result: Option<GenerationResult>,
    pub error: Option<PieceFailure>,
}

impl BatchPieceState {
    fn pending(garment: GarmentSelection) -> Self {
        Self {
            garment,
            status: PieceStatus::Pending,
            result: None,
            error: None,
        }
    }
}

/// Final output of a settled job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum BatchArtifact {
    /// All successful pieces merged into one image
    Merged {
        merged_image_ref: String,
        pieces: Vec<GenerationResult>,
    },
    /// Per-piece results in piece order, no merge
    Pieces { pieces: Vec<GenerationResult> },
}

impl BatchArtifact {
    pub fn merged_image_ref(&self) -> Option<&str> {
        match self {
            Self::Merged {
                merged_image_ref, ..
            } => Some(merged_image_ref),
            Self::Pieces { .. } => None,
        }
    }

    pub fn pieces(&self) -> &[GenerationResult] {
        match self {
            Self::Merged { pieces, .. } | Self::Pieces { pieces } => pieces,
        }
    }
}

/// Progress snapshot emitted after every settled piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub job_id: BatchJobId,
    pub completed: usize,
    pub total: usize,
    /// Index of the piece whose settlement produced this snapshot
    pub last_settled: Option<usize>,
    pub status: BatchStatus,
}

impl BatchProgress {
    /// Completion ratio in `0.0..=1.0`
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f32 / self.total as f32
    }
}

/// A multi-piece fitting run against one avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJob {
    id: BatchJobId,
    pieces: Vec<BatchPieceState>,
    avatar_ref: Option<String>,
    compose_mode: bool,
    label: String,
    status: BatchStatus,
    cancel_requested: bool,
    artifact: Option<BatchArtifact>,
    compose_error: Option<String>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl BatchJob {
    /// Create an idle job. The piece list is fixed from here on.
    pub fn new(
        pieces: Vec<GarmentSelection>,
        avatar_ref: Option<String>,
        compose_mode: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let label = default_label(&pieces);
        Self {
            id: BatchJobId::new(),
            pieces: pieces.into_iter().map(BatchPieceState::pending).collect(),
            avatar_ref,
            compose_mode,
            label,
            status: BatchStatus::Idle,
            cancel_requested: false,
            artifact: None,
            compose_error: None,
            failure_reason: None,
            created_at: now,
            finished_at: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> BatchJobId {
        self.id
    }

    pub fn pieces(&self) -> &[BatchPieceState] {
        &self.pieces
    }

    pub fn piece(&self, index: usize) -> Option<&BatchPieceState> {
        self.pieces.get(index)
    }

    pub fn avatar_ref(&self) -> Option<&str> {
        self.avatar_ref.as_deref()
    }

    pub fn compose_mode(&self) -> bool {
        self.compose_mode
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub fn artifact(&self) -> Option<&BatchArtifact> {
        self.artifact.as_ref()
    }

    pub fn compose_error(&self) -> Option<&str> {
        self.compose_error.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn total(&self) -> usize {
        self.pieces.len()
    }

    /// Number of pieces with a recorded outcome
    pub fn completed_count(&self) -> usize {
        self.pieces.iter().filter(|p| p.status.is_settled()).count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| p.status == PieceStatus::Done)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| p.status == PieceStatus::Failed)
            .count()
    }

    /// Successful results in piece order
    pub fn piece_results(&self) -> Vec<GenerationResult> {
        self.pieces
            .iter()
            .filter_map(|p| p.result.clone())
            .collect()
    }

    pub fn progress(&self, last_settled: Option<usize>) -> BatchProgress {
        BatchProgress {
            job_id: self.id,
            completed: self.completed_count(),
            total: self.total(),
            last_settled,
            status: self.status,
        }
    }

    // --- State transitions ---

    /// Entry precondition: at least one piece and a configured avatar
    pub fn check_preconditions(&self) -> Result<(), DomainError> {
        if self.pieces.is_empty() {
            return Err(DomainError::validation("batch job has no pieces"));
        }
        match self.avatar_ref.as_deref() {
            Some(avatar) if !avatar.trim().is_empty() => Ok(()),
            _ => Err(DomainError::validation("no avatar configured for batch job")),
        }
    }

    /// Idle -> Running
    pub fn start(&mut self) -> Result<(), DomainError> {
        self.expect_status(BatchStatus::Idle, BatchStatus::Running)?;
        self.check_preconditions()?;
        self.status = BatchStatus::Running;
        Ok(())
    }

    /// Idle -> Failed, for precondition violations only
    pub fn fail_precondition(
        &mut self,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.expect_status(BatchStatus::Idle, BatchStatus::Failed)?;
        self.status = BatchStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.finished_at = Some(now);
        Ok(())
    }

    /// Record that a cancel was requested; observed between pieces
    pub fn request_cancel(&mut self) {
        if !self.status.is_terminal() {
            self.cancel_requested = true;
        }
    }

    /// Pending -> Processing
    pub fn begin_piece(&mut self, index: usize) -> Result<&GarmentSelection, DomainError> {
        if self.status != BatchStatus::Running {
            return Err(DomainError::invalid_state_transition(format!(
                "cannot start piece {} while job is {}",
                index, self.status
            )));
        }
        let piece = self.piece_mut(index)?;
        if piece.status != PieceStatus::Pending {
            return Err(DomainError::invalid_state_transition(format!(
                "piece {}: {} -> processing",
                index, piece.status
            )));
        }
        piece.status = PieceStatus::Processing;
        Ok(&piece.garment)
    }

    /// Processing -> Done
    pub fn settle_done(
        &mut self,
        index: usize,
        result: GenerationResult,
    ) -> Result<(), DomainError> {
        let piece = self.processing_piece(index, PieceStatus::Done)?;
        piece.status = PieceStatus::Done;
        piece.result = Some(result);
        Ok(())
    }

    /// Processing -> Failed
    pub fn settle_failed(
        &mut self,
        index: usize,
        failure: PieceFailure,
    ) -> Result<(), DomainError> {
        let piece = self.processing_piece(index, PieceStatus::Failed)?;
        piece.status = PieceStatus::Failed;
        piece.error = Some(failure);
        Ok(())
    }

    /// Running -> Completed. Every piece must be settled.
    pub fn complete(
        &mut self,
        artifact: BatchArtifact,
        compose_error: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.expect_status(BatchStatus::Running, BatchStatus::Completed)?;
        if self.completed_count() != self.total() {
            return Err(DomainError::invalid_state_transition(format!(
                "cannot complete with {}/{} pieces settled",
                self.completed_count(),
                self.total()
            )));
        }
        self.status = BatchStatus::Completed;
        self.artifact = Some(artifact);
        self.compose_error = compose_error;
        self.finished_at = Some(now);
        Ok(())
    }

    /// Running -> Cancelled.
    ///
    /// Pieces that never started are settled as cancelled failures; settled
    /// outcomes are kept as they are.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.expect_status(BatchStatus::Running, BatchStatus::Cancelled)?;
        if self
            .pieces
            .iter()
            .any(|p| p.status == PieceStatus::Processing)
        {
            return Err(DomainError::invalid_state_transition(
                "cannot cancel while a piece is still processing",
            ));
        }
        for piece in self
            .pieces
            .iter_mut()
            .filter(|p| p.status == PieceStatus::Pending)
        {
            piece.status = PieceStatus::Failed;
            piece.error = Some(PieceFailure::cancelled());
        }
        self.cancel_requested = true;
        self.status = BatchStatus::Cancelled;
        self.artifact = Some(BatchArtifact::Pieces {
            pieces: self.piece_results(),
        });
        self.finished_at = Some(now);
        Ok(())
    }

    fn expect_status(&self, from: BatchStatus, to: BatchStatus) -> Result<(), DomainError> {
        if self.status != from {
            return Err(DomainError::invalid_state_transition(format!(
                "{} -> {}",
                self.status, to
            )));
        }
        Ok(())
    }

    fn piece_mut(&mut self, index: usize) -> Result<&mut BatchPieceState, DomainError> {
        let len = self.pieces.len();
        self.pieces
            .get_mut(index)
            .ok_or(DomainError::index_out_of_bounds(index, len))
    }

    fn processing_piece(
        &mut self,
        index: usize,
        target: PieceStatus,
    ) -> Result<&mut BatchPieceState, DomainError> {
        let piece = self.piece_mut(index)?;
        if piece.status != PieceStatus::Processing {
            return Err(DomainError::invalid_state_transition(format!(
                "piece {}: {} -> {}",
                index, piece.status, target
            )));
        }
        Ok(piece)
    }
}

/// "Look: upper_body + lower_body" style label from the piece categories
fn default_label(pieces: &[GarmentSelection]) -> String {
    if pieces.is_empty() {
        return "Look".to_string();
    }
    let categories: Vec<&str> = pieces.iter().map(|p| p.category().as_str()).collect();
    format!("Look: {}", categories.join(" + "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GarmentCategory, GarmentSource, ModelTier};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 18, 0, 0).unwrap()
    }

    fn garment(name: &str, category: GarmentCategory) -> GarmentSelection {
        GarmentSelection::new(format!("https://cdn.example.com/{name}.png"), GarmentSource::Closet, category)
    }

    fn look() -> Vec<GarmentSelection> {
        vec![
            garment("shirt", GarmentCategory::UpperBody),
            garment("jeans", GarmentCategory::LowerBody),
        ]
    }

    fn result_for(index: usize) -> GenerationResult {
        GenerationResult::completed(format!("out-{index}.png"), "g.png", ModelTier::BASELINE, 5, now())
    }

    #[test]
    fn label_lists_piece_categories() {
        let job = BatchJob::new(look(), Some("me.png".into()), true, now());
        assert_eq!(job.label(), "Look: upper_body + lower_body");
        let job = job.with_label("Friday dinner");
        assert_eq!(job.label(), "Friday dinner");
    }

    #[test]
    fn start_requires_pieces_and_avatar() {
        let mut empty = BatchJob::new(vec![], Some("me.png".into()), false, now());
        assert!(empty.start().is_err());
        assert_eq!(empty.status(), BatchStatus::Idle);

        let mut no_avatar = BatchJob::new(look(), Some("  ".into()), false, now());
        assert!(no_avatar.check_preconditions().is_err());
        assert!(no_avatar.start().is_err());

        let mut ok = BatchJob::new(look(), Some("me.png".into()), false, now());
        assert!(ok.start().is_ok());
        assert_eq!(ok.status(), BatchStatus::Running);
    }

    #[test]
    fn pieces_move_forward_only() {
        let mut job = BatchJob::new(look(), Some("me.png".into()), false, now());
        job.start().unwrap();

        assert!(job.settle_done(0, result_for(0)).is_err());
        job.begin_piece(0).unwrap();
        assert!(job.begin_piece(0).is_err());
        job.settle_done(0, result_for(0)).unwrap();
        assert!(job
            .settle_failed(0, PieceFailure::new(PieceFailureKind::Transient, "late"))
            .is_err());
        assert_eq!(job.completed_count(), 1);
        assert_eq!(job.piece(0).unwrap().status, PieceStatus::Done);
    }

    #[test]
    fn complete_requires_all_pieces_settled() {
        let mut job = BatchJob::new(look(), Some("me.png".into()), false, now());
        job.start().unwrap();
        job.begin_piece(0).unwrap();
        job.settle_done(0, result_for(0)).unwrap();

        let artifact = BatchArtifact::Pieces { pieces: job.piece_results() };
        assert!(job.complete(artifact.clone(), None, now()).is_err());

        job.begin_piece(1).unwrap();
        job.settle_failed(1, PieceFailure::new(PieceFailureKind::Terminal, "bad image"))
            .unwrap();
        job.complete(artifact, None, now()).unwrap();

        assert_eq!(job.status(), BatchStatus::Completed);
        assert_eq!(job.succeeded_count(), 1);
        assert_eq!(job.failed_count(), 1);
        assert_eq!(job.finished_at(), Some(now()));
    }

    #[test]
    fn cancel_settles_unstarted_pieces() {
        let mut job = BatchJob::new(look(), Some("me.png".into()), false, now());
        job.start().unwrap();
        job.begin_piece(0).unwrap();
        assert!(job.cancel(now()).is_err(), "in-flight piece must settle first");

        job.settle_done(0, result_for(0)).unwrap();
        job.cancel(now()).unwrap();

        assert_eq!(job.status(), BatchStatus::Cancelled);
        assert_eq!(job.completed_count(), job.total());
        let second = job.piece(1).unwrap();
        assert_eq!(second.status, PieceStatus::Failed);
        assert_eq!(second.error.as_ref().unwrap().kind, PieceFailureKind::Cancelled);
        assert_eq!(job.artifact().unwrap().pieces().len(), 1);
    }

    #[test]
    fn fail_precondition_only_from_idle() {
        let mut job = BatchJob::new(vec![], None, true, now());
        job.fail_precondition("batch job has no pieces", now()).unwrap();
        assert_eq!(job.status(), BatchStatus::Failed);
        assert_eq!(job.failure_reason(), Some("batch job has no pieces"));
        assert!(job.fail_precondition("again", now()).is_err());
    }

    #[test]
    fn progress_fraction() {
        let mut job = BatchJob::new(look(), Some("me.png".into()), false, now());
        job.start().unwrap();
        job.begin_piece(0).unwrap();
        job.settle_done(0, result_for(0)).unwrap();
        let progress = job.progress(Some(0));
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.total, 2);
        assert!((progress.fraction() - 0.5).abs() < f32::EPSILON);
    }
}
