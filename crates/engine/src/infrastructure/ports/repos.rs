//! Repository port traits for result persistence.

use async_trait::async_trait;
use tryon_domain::{GenerationResult, ResultId, UserFeedback};

use super::error::RepoError;

/// External store mirroring generated variants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultRepo: Send + Sync {
    async fn create(&self, result: &GenerationResult) -> Result<(), RepoError>;
    async fn get(&self, id: ResultId) -> Result<Option<GenerationResult>, RepoError>;
    async fn delete(&self, id: ResultId) -> Result<(), RepoError>;
    async fn update_feedback(&self, id: ResultId, feedback: UserFeedback)
        -> Result<(), RepoError>;
}
