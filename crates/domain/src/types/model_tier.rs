//! Model tier - quality/cost level offered by the generation backend

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Highest tier index an explicit retry may escalate to.
pub const MAX_RETRIES: u8 = 2;

/// Quality tier used for a single generation attempt (0, 1 or 2).
///
/// Tier 0 is the baseline. Interactive retries step up one tier at a time;
/// batch submissions always use the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ModelTier(u8);

impl ModelTier {
    pub const BASELINE: ModelTier = ModelTier(0);
    pub const HIGHEST: ModelTier = ModelTier(MAX_RETRIES);

    pub fn new(value: u8) -> Result<Self, DomainError> {
        if value > MAX_RETRIES {
            return Err(DomainError::validation(format!(
                "model tier must be between 0 and {}, got {}",
                MAX_RETRIES, value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// The tier one step above this one, or `None` at the top.
    pub fn next(&self) -> Option<ModelTier> {
        if self.0 >= MAX_RETRIES {
            None
        } else {
            Some(ModelTier(self.0 + 1))
        }
    }

    pub fn is_highest(&self) -> bool {
        self.0 == MAX_RETRIES
    }
}

impl TryFrom<u8> for ModelTier {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ModelTier> for u8 {
    fn from(tier: ModelTier) -> Self {
        tier.0
    }
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tier {}", self.0)
    }
}
