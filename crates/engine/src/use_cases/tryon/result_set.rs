//! Result set - the variants generated for the selected garment.

use std::sync::Arc;

use tryon_domain::{GenerationResult, ResultId, UserFeedback, MAX_OPTIONS};

use crate::infrastructure::ports::{RepoError, ResultRepo};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResultSetError {
    #[error("Result set is full")]
    Full,
    #[error("No result at index {index} (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// A store call that failed after the local change was applied.
///
/// Local state is never rolled back and the call is not retried.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{operation} for result {result_id} was not persisted: {source}")]
pub struct PersistenceWarning {
    pub operation: &'static str,
    pub result_id: ResultId,
    pub source: RepoError,
}

impl PersistenceWarning {
    pub(crate) fn new(operation: &'static str, result_id: ResultId, source: RepoError) -> Self {
        tracing::warn!(
            operation,
            result_id = %result_id,
            error = %source,
            "Result store call failed; keeping local state"
        );
        Self {
            operation,
            result_id,
            source,
        }
    }
}

/// Outcome of removing a variant
#[derive(Debug)]
pub struct Removed {
    pub result: GenerationResult,
    pub warning: Option<PersistenceWarning>,
}

/// Ordered variants for one garment selection, capped at `MAX_OPTIONS`.
///
/// `selected_index` points at a member whenever the set is non-empty and is
/// `None` when it is empty.
pub struct ResultSet {
    repo: Arc<dyn ResultRepo>,
    results: Vec<GenerationResult>,
    selected: Option<usize>,
}

impl ResultSet {
    pub fn new(repo: Arc<dyn ResultRepo>) -> Self {
        Self {
            repo,
            results: Vec::with_capacity(MAX_OPTIONS),
            selected: None,
        }
    }

    pub fn results(&self) -> &[GenerationResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn can_append(&self) -> bool {
        self.results.len() < MAX_OPTIONS
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&GenerationResult> {
        self.selected.and_then(|i| self.results.get(i))
    }

    /// Add a variant and select it.
    pub fn append(&mut self, result: GenerationResult) -> Result<usize, ResultSetError> {
        if !self.can_append() {
            return Err(ResultSetError::Full);
        }
        self.results.push(result);
        let index = self.results.len() - 1;
        self.selected = Some(index);
        Ok(index)
    }

    pub fn select(&mut self, index: usize) -> Result<(), ResultSetError> {
        self.check_index(index)?;
        self.selected = Some(index);
        Ok(())
    }

    /// Remove locally, then ask the store to delete the record once.
    pub async fn remove(&mut self, index: usize) -> Result<Removed, ResultSetError> {
        self.check_index(index)?;
        let result = self.results.remove(index);

        self.selected = match self.selected {
            _ if self.results.is_empty() => None,
            Some(selected) if selected == index => Some(index.saturating_sub(1)),
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };

        let warning = self
            .repo
            .delete(result.id())
            .await
            .err()
            .map(|e| PersistenceWarning::new("delete", result.id(), e));

        Ok(Removed { result, warning })
    }

    /// Tag a variant locally, then mirror the tag to the store.
    pub async fn set_feedback(
        &mut self,
        index: usize,
        feedback: UserFeedback,
    ) -> Result<Option<PersistenceWarning>, ResultSetError> {
        self.check_index(index)?;
        let result = &mut self.results[index];
        result.set_feedback(feedback);
        let id = result.id();

        Ok(self
            .repo
            .update_feedback(id, feedback)
            .await
            .err()
            .map(|e| PersistenceWarning::new("update_feedback", id, e)))
    }

    /// Clear all variants and the selection. Store records are left alone.
    pub fn reset(&mut self) {
        self.results.clear();
        self.selected = None;
    }

    fn check_index(&self, index: usize) -> Result<(), ResultSetError> {
        if index >= self.results.len() {
            return Err(ResultSetError::IndexOutOfBounds {
                index,
                len: self.results.len(),
            });
        }
        Ok(())
    }
}
