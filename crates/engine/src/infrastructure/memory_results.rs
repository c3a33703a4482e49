//! In-memory result store for local runs and tests
//!
//! Keeps generated variants in a concurrent map. Nothing is persisted across
//! process restarts.

use async_trait::async_trait;
use dashmap::DashMap;
use tryon_domain::{GenerationResult, ResultId, UserFeedback};

use crate::infrastructure::ports::{RepoError, ResultRepo};

#[derive(Default)]
pub struct InMemoryResultRepo {
    results: DashMap<ResultId, GenerationResult>,
}

impl InMemoryResultRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[async_trait]
impl ResultRepo for InMemoryResultRepo {
    async fn create(&self, result: &GenerationResult) -> Result<(), RepoError> {
        self.results.insert(result.id(), result.clone());
        Ok(())
    }

    async fn get(&self, id: ResultId) -> Result<Option<GenerationResult>, RepoError> {
        Ok(self.results.get(&id).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, id: ResultId) -> Result<(), RepoError> {
        self.results
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepoError::not_found("GenerationResult", id))
    }

    async fn update_feedback(
        &self,
        id: ResultId,
        feedback: UserFeedback,
    ) -> Result<(), RepoError> {
        let mut entry = self
            .results
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("GenerationResult", id))?;
        entry.set_feedback(feedback);
        Ok(())
    }
}
