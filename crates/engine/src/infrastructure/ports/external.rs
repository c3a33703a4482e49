//! External service port traits (generation and compose services).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tryon_domain::{GarmentCategory, GarmentSelection, ModelTier};

use super::error::{ComposeError, GenerationError};

// =============================================================================
// Generation Service
// =============================================================================

/// One submission attempt for a garment fitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub avatar_image_ref: String,
    pub garment_image_ref: String,
    pub category: GarmentCategory,
    pub model_tier: ModelTier,
    /// Zero-based attempt counter for the garment
    pub attempt_index: u32,
    pub demo_mode: bool,
}

impl GenerationRequest {
    pub fn new(
        avatar_image_ref: impl Into<String>,
        garment: &GarmentSelection,
        model_tier: ModelTier,
        attempt_index: u32,
    ) -> Self {
        Self {
            avatar_image_ref: avatar_image_ref.into(),
            garment_image_ref: garment.image_ref().to_string(),
            category: garment.category(),
            model_tier,
            attempt_index,
            demo_mode: false,
        }
    }

    pub fn with_demo_mode(mut self, demo_mode: bool) -> Self {
        self.demo_mode = demo_mode;
        self
    }
}

/// Successful service reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutput {
    pub result_image_ref: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationPort: Send + Sync {
    /// Exactly one call to the service; errors are already classified.
    async fn submit(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError>;
    async fn check_health(&self) -> Result<bool, GenerationError>;
}

// =============================================================================
// Compose Service
// =============================================================================

/// Merge request for the successful pieces of a look
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRequest {
    pub avatar_ref: String,
    pub ordered_image_refs: Vec<String>,
    pub label: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComposePort: Send + Sync {
    /// Returns the merged image reference
    async fn compose(&self, request: ComposeRequest) -> Result<String, ComposeError>;
}
