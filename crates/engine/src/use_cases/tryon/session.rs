//! Interactive try-on session - one user fitting garments one at a time.

use std::sync::Arc;

use tryon_domain::{GarmentSelection, GenerationResult, ModelTier, TryOnConfig, UserFeedback};

use super::result_set::{PersistenceWarning, Removed, ResultSet, ResultSetError};
use super::retry_policy::{PolicyError, RetryEscalationPolicy};
use crate::entities::GenerationClient;
use crate::infrastructure::ports::{ClockPort, GenerationError, GenerationRequest, ResultRepo};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TryOnError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    ResultSet(#[from] ResultSetError),
    #[error("Nothing to retry for the selected garment")]
    NothingToRetry,
    #[error("Last attempt cannot be retried: {0}")]
    NotRetryable(String),
}

/// A variant produced by `generate` or `retry`
#[derive(Debug)]
pub struct Generated {
    pub result: GenerationResult,
    /// Position in the result set; also the new selection
    pub index: usize,
    pub tier: ModelTier,
    pub warning: Option<PersistenceWarning>,
}

/// Owns the result set and retry state for one user.
pub struct TryOnSession {
    generation: Arc<GenerationClient>,
    repo: Arc<dyn ResultRepo>,
    policy: RetryEscalationPolicy,
    results: ResultSet,
    demo_mode: bool,
    avatar_ref: Option<String>,
    garment: Option<GarmentSelection>,
    last_failure: Option<GenerationError>,
}

impl TryOnSession {
    pub fn new(
        generation: Arc<GenerationClient>,
        repo: Arc<dyn ResultRepo>,
        clock: Arc<dyn ClockPort>,
        config: &TryOnConfig,
    ) -> Self {
        Self {
            generation,
            policy: RetryEscalationPolicy::new(clock, config.cooldown()),
            results: ResultSet::new(repo.clone()),
            repo,
            demo_mode: config.demo_mode(),
            avatar_ref: None,
            garment: None,
            last_failure: None,
        }
    }

    // --- Accessors ---

    pub fn avatar_ref(&self) -> Option<&str> {
        self.avatar_ref.as_deref()
    }

    pub fn garment(&self) -> Option<&GarmentSelection> {
        self.garment.as_ref()
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn last_failure(&self) -> Option<&GenerationError> {
        self.last_failure.as_ref()
    }

    /// Seconds before the selected garment may be submitted again
    pub fn cooldown_remaining(&self) -> u64 {
        self.garment
            .as_ref()
            .map(|g| self.policy.cooldown_remaining(&g.key()))
            .unwrap_or(0)
    }

    /// True when a retry would be accepted, ignoring cooldown
    pub fn can_retry(&self) -> bool {
        let Some(garment) = self.garment.as_ref() else {
            return false;
        };
        let key = garment.key();
        self.policy.has_attempted(&key)
            && self.policy.can_escalate(&key)
            && !self.last_failure.as_ref().is_some_and(|e| e.is_terminal())
            && self.results.can_append()
    }

    // --- Selection ---

    pub fn set_avatar(&mut self, avatar_ref: impl Into<String>) {
        self.avatar_ref = Some(avatar_ref.into());
    }

    /// Select the garment to fit. Returns true when the identity changed, in
    /// which case results and retry state start over.
    pub fn select_garment(&mut self, garment: GarmentSelection) -> bool {
        if self
            .garment
            .as_ref()
            .is_some_and(|current| current.same_identity(&garment))
        {
            return false;
        }

        let key = garment.key();
        tracing::debug!(garment = %key, "Garment selection changed");
        self.results.reset();
        self.policy.reset(&key);
        self.last_failure = None;
        self.garment = Some(garment);
        true
    }

    // --- Generation ---

    /// Submit the selected garment at the next tier.
    ///
    /// A failed submission still consumes its tier. The cooldown runs from the
    /// moment the outcome arrives.
    pub async fn generate(&mut self) -> Result<Generated, TryOnError> {
        let avatar = self
            .avatar_ref
            .clone()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| GenerationError::invalid_input("no avatar configured"))?;
        let garment = self
            .garment
            .clone()
            .ok_or_else(|| GenerationError::invalid_input("no garment selected"))?;
        garment
            .validate()
            .map_err(|e| GenerationError::invalid_input(e.to_string()))?;

        if !self.results.can_append() {
            return Err(ResultSetError::Full.into());
        }

        let key = garment.key();
        let attempt = self.policy.next_attempt(&key)?;
        let request = GenerationRequest::new(avatar, &garment, attempt.tier, attempt.index)
            .with_demo_mode(self.demo_mode);

        let outcome = self.generation.submit(request).await;
        self.policy.record_settled(&key);
        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    garment = %key,
                    tier = %attempt.tier,
                    error = %e,
                    "Try-on attempt failed"
                );
                self.last_failure = Some(e.clone());
                return Err(e.into());
            }
        };
        self.last_failure = None;

        let warning = self
            .repo
            .create(&result)
            .await
            .err()
            .map(|e| PersistenceWarning::new("create", result.id(), e));
        let index = self.results.append(result.clone())?;

        tracing::info!(garment = %key, tier = %attempt.tier, index, "Try-on variant added");
        Ok(Generated {
            result,
            index,
            tier: attempt.tier,
            warning,
        })
    }

    /// Explicit user retry at the next tier up.
    pub async fn retry(&mut self) -> Result<Generated, TryOnError> {
        let attempted = self
            .garment
            .as_ref()
            .is_some_and(|g| self.policy.has_attempted(&g.key()));
        if !attempted {
            return Err(TryOnError::NothingToRetry);
        }
        if let Some(failure) = self.last_failure.as_ref().filter(|e| e.is_terminal()) {
            return Err(TryOnError::NotRetryable(failure.to_string()));
        }
        self.generate().await
    }

    // --- Result management ---

    pub fn select_result(&mut self, index: usize) -> Result<(), TryOnError> {
        Ok(self.results.select(index)?)
    }

    pub async fn remove_result(&mut self, index: usize) -> Result<Removed, TryOnError> {
        Ok(self.results.remove(index).await?)
    }

    pub async fn set_feedback(
        &mut self,
        index: usize,
        feedback: UserFeedback,
    ) -> Result<Option<PersistenceWarning>, TryOnError> {
        Ok(self.results.set_feedback(index, feedback).await?)
    }
}
