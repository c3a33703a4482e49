//! GenerationResult entity - one generated fitting variant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ModelTier, ResultStatus, UserFeedback};
use crate::ResultId;

/// A single variant produced by the generation service.
///
/// Owned by the result set that produced it and mirrored in the external store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    id: ResultId,
    /// Reference to the generated image
    result_image_ref: String,
    /// Garment image that was fitted
    garment_image_ref: String,
    status: ResultStatus,
    created_at: DateTime<Utc>,
    model_tier_used: ModelTier,
    user_feedback: UserFeedback,
    /// Wall-clock time the service took, in milliseconds
    duration_ms: u64,
}

impl GenerationResult {
    /// Create a completed result returned by the service
    pub fn completed(
        result_image_ref: impl Into<String>,
        garment_image_ref: impl Into<String>,
        model_tier_used: ModelTier,
        duration_ms: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ResultId::new(),
            result_image_ref: result_image_ref.into(),
            garment_image_ref: garment_image_ref.into(),
            status: ResultStatus::Completed,
            created_at: now,
            model_tier_used,
            user_feedback: UserFeedback::None,
            duration_ms,
        }
    }

    // --- Accessors ---

    pub fn id(&self) -> ResultId {
        self.id
    }

    pub fn result_image_ref(&self) -> &str {
        &self.result_image_ref
    }

    pub fn garment_image_ref(&self) -> &str {
        &self.garment_image_ref
    }

    pub fn status(&self) -> ResultStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn model_tier_used(&self) -> ModelTier {
        self.model_tier_used
    }

    pub fn user_feedback(&self) -> UserFeedback {
        self.user_feedback
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    // --- Mutation methods ---

    pub fn set_feedback(&mut self, feedback: UserFeedback) {
        self.user_feedback = feedback;
    }
}
