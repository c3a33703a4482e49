//! Batch orchestrator - "try the whole look" against one avatar.
//!
//! Pieces run strictly one after another in creation order. Cancellation is
//! polled between pieces only; an in-flight request always settles and is
//! recorded.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tryon_domain::{
    BatchArtifact, BatchJob, BatchProgress, BatchStatus, DomainError, ModelTier, PieceFailure,
    PieceFailureKind,
};

use crate::entities::{ComposeStep, GenerationClient};
use crate::infrastructure::ports::{ClockPort, GenerationError, GenerationRequest};

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Batch job already ran (status {0})")]
    AlreadyStarted(BatchStatus),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Drives batch jobs through generation and the optional compose step.
pub struct BatchOrchestrator {
    generation: Arc<GenerationClient>,
    compose: Arc<ComposeStep>,
    clock: Arc<dyn ClockPort>,
    demo_mode: bool,
}

impl BatchOrchestrator {
    pub fn new(
        generation: Arc<GenerationClient>,
        compose: Arc<ComposeStep>,
        clock: Arc<dyn ClockPort>,
        demo_mode: bool,
    ) -> Self {
        Self {
            generation,
            compose,
            clock,
            demo_mode,
        }
    }

    /// Run an idle job to settlement and return its final status.
    ///
    /// A precondition violation settles the job as `Failed` without touching
    /// any piece. Piece failures never abort the run.
    pub async fn run(
        &self,
        job: &mut BatchJob,
        cancel: &CancellationToken,
        progress: Option<&UnboundedSender<BatchProgress>>,
    ) -> Result<BatchStatus, BatchError> {
        if job.status() != BatchStatus::Idle {
            return Err(BatchError::AlreadyStarted(job.status()));
        }

        if let Err(e) = job.check_preconditions() {
            tracing::warn!(job_id = %job.id(), error = %e, "Batch job precondition failed");
            job.fail_precondition(e.to_string(), self.clock.now())?;
            emit(progress, job.progress(None));
            return Ok(job.status());
        }

        job.start()?;
        tracing::info!(
            job_id = %job.id(),
            pieces = job.total(),
            compose = job.compose_mode(),
            "Batch job started"
        );
        emit(progress, job.progress(None));

        let avatar = job.avatar_ref().unwrap_or_default().to_string();

        for index in 0..job.total() {
            if cancel.is_cancelled() {
                job.request_cancel();
                break;
            }

            let garment = job.begin_piece(index)?.clone();
            let request = GenerationRequest::new(avatar.as_str(), &garment, ModelTier::BASELINE, 0)
                .with_demo_mode(self.demo_mode);

            match self.generation.submit(request).await {
                Ok(result) => {
                    tracing::info!(job_id = %job.id(), piece = index, "Piece done");
                    job.settle_done(index, result)?;
                }
                Err(e) => {
                    tracing::warn!(job_id = %job.id(), piece = index, error = %e, "Piece failed");
                    job.settle_failed(index, piece_failure(&e))?;
                }
            }
            emit(progress, job.progress(Some(index)));
        }

        if cancel.is_cancelled() {
            job.request_cancel();
        }
        if job.cancel_requested() {
            job.cancel(self.clock.now())?;
            tracing::info!(
                job_id = %job.id(),
                settled = job.succeeded_count(),
                "Batch job cancelled"
            );
            emit(progress, job.progress(None));
            return Ok(job.status());
        }

        let (artifact, compose_error) = self.finish(job, &avatar).await;
        job.complete(artifact, compose_error, self.clock.now())?;
        tracing::info!(
            job_id = %job.id(),
            succeeded = job.succeeded_count(),
            failed = job.failed_count(),
            merged = job.artifact().and_then(|a| a.merged_image_ref()).is_some(),
            "Batch job completed"
        );
        emit(progress, job.progress(None));
        Ok(job.status())
    }

    /// Build the final artifact, merging when compose mode is on and at least
    /// one piece succeeded.
    async fn finish(&self, job: &BatchJob, avatar: &str) -> (BatchArtifact, Option<String>) {
        let pieces = job.piece_results();
        if !job.compose_mode() || pieces.is_empty() {
            return (BatchArtifact::Pieces { pieces }, None);
        }

        match self.compose.run(avatar, &pieces, job.label()).await {
            Ok(merged_image_ref) => (
                BatchArtifact::Merged {
                    merged_image_ref,
                    pieces,
                },
                None,
            ),
            Err(e) => {
                tracing::warn!(
                    job_id = %job.id(),
                    error = %e,
                    "Compose failed; keeping per-piece results"
                );
                (BatchArtifact::Pieces { pieces }, Some(e.to_string()))
            }
        }
    }
}

fn piece_failure(error: &GenerationError) -> PieceFailure {
    let kind = match error {
        GenerationError::InvalidInput(_) => PieceFailureKind::InvalidInput,
        GenerationError::Transient(_) => PieceFailureKind::Transient,
        GenerationError::Terminal(_) => PieceFailureKind::Terminal,
    };
    PieceFailure::new(kind, error.to_string())
}

fn emit(progress: Option<&UnboundedSender<BatchProgress>>, snapshot: BatchProgress) {
    if let Some(tx) = progress {
        if tx.send(snapshot).is_err() {
            tracing::debug!("Progress receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{
        ComposeError, GenerationOutput, GenerationPort, MockComposePort, MockGenerationPort,
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tryon_domain::{GarmentCategory, GarmentSelection, GarmentSource, PieceStatus};

    fn clock() -> Arc<dyn ClockPort> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 10, 4, 20, 0, 0).unwrap(),
        ))
    }

    fn look(n: usize) -> Vec<GarmentSelection> {
        let categories = [
            GarmentCategory::UpperBody,
            GarmentCategory::LowerBody,
            GarmentCategory::Dresses,
        ];
        (0..n)
            .map(|i| {
                GarmentSelection::new(
                    format!("piece-{i}.png"),
                    GarmentSource::Closet,
                    categories[i % categories.len()],
                )
            })
            .collect()
    }

    fn orchestrator(
        generation: Arc<dyn GenerationPort>,
        compose: MockComposePort,
    ) -> BatchOrchestrator {
        let clock = clock();
        BatchOrchestrator::new(
            Arc::new(GenerationClient::new(
                generation,
                clock.clone(),
                Duration::from_secs(5),
            )),
            Arc::new(ComposeStep::new(Arc::new(compose), Duration::from_secs(5))),
            clock,
            false,
        )
    }

    fn succeeding_port() -> MockGenerationPort {
        let mut port = MockGenerationPort::new();
        port.expect_submit()
            .withf(|r| r.model_tier == ModelTier::BASELINE && r.attempt_index == 0)
            .returning(|r| {
                Ok(GenerationOutput {
                    result_image_ref: format!("fit-{}", r.garment_image_ref),
                })
            });
        port
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<BatchProgress>) -> Vec<BatchProgress> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn three_pieces_all_succeed_and_merge() {
        let mut compose = MockComposePort::new();
        compose
            .expect_compose()
            .times(1)
            .withf(|req| {
                req.ordered_image_refs
                    == vec![
                        "fit-piece-0.png".to_string(),
                        "fit-piece-1.png".to_string(),
                        "fit-piece-2.png".to_string(),
                    ]
                    && req.avatar_ref == "me.png"
            })
            .returning(|_| Ok("look.png".into()));
        let orchestrator = orchestrator(Arc::new(succeeding_port()), compose);
        let mut job = BatchJob::new(look(3), Some("me.png".into()), true, Utc::now());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let status = orchestrator
            .run(&mut job, &CancellationToken::new(), Some(&tx))
            .await
            .unwrap();

        assert_eq!(status, BatchStatus::Completed);
        assert_eq!(job.succeeded_count(), 3);
        let artifact = job.artifact().unwrap();
        assert_eq!(artifact.merged_image_ref(), Some("look.png"));
        assert_eq!(artifact.pieces().len(), 3);
        assert!(job.compose_error().is_none());

        let events = drain(&mut rx);
        let completed: Vec<usize> = events.iter().map(|e| e.completed).collect();
        assert!(completed.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(events.last().unwrap().completed, 3);
        assert_eq!(events.last().unwrap().status, BatchStatus::Completed);
        let settled: Vec<usize> = events.iter().filter_map(|e| e.last_settled).collect();
        assert_eq!(settled, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn empty_look_fails_without_network() {
        let mut port = MockGenerationPort::new();
        port.expect_submit().never();
        let mut compose = MockComposePort::new();
        compose.expect_compose().never();
        let orchestrator = orchestrator(Arc::new(port), compose);
        let mut job = BatchJob::new(vec![], Some("me.png".into()), true, Utc::now());

        let status = orchestrator
            .run(&mut job, &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(status, BatchStatus::Failed);
        assert!(job.failure_reason().is_some());
        assert!(job.artifact().is_none());
    }

    #[tokio::test]
    async fn missing_avatar_fails_without_touching_pieces() {
        let mut port = MockGenerationPort::new();
        port.expect_submit().never();
        let orchestrator = orchestrator(Arc::new(port), MockComposePort::new());
        let mut job = BatchJob::new(look(2), None, false, Utc::now());

        let status = orchestrator
            .run(&mut job, &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(status, BatchStatus::Failed);
        assert!(job.pieces().iter().all(|p| p.status == PieceStatus::Pending));
    }

    #[tokio::test]
    async fn piece_failures_never_abort_the_batch() {
        let mut port = MockGenerationPort::new();
        port.expect_submit().returning(|r| {
            if r.garment_image_ref == "piece-1.png" {
                Err(GenerationError::terminal("invalid garment image"))
            } else {
                Ok(GenerationOutput {
                    result_image_ref: format!("fit-{}", r.garment_image_ref),
                })
            }
        });
        let mut compose = MockComposePort::new();
        compose
            .expect_compose()
            .times(1)
            .withf(|req| req.ordered_image_refs.len() == 2)
            .returning(|_| Ok("look.png".into()));
        let orchestrator = orchestrator(Arc::new(port), compose);
        let mut job = BatchJob::new(look(3), Some("me.png".into()), true, Utc::now());

        let status = orchestrator
            .run(&mut job, &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(status, BatchStatus::Completed);
        assert_eq!(job.completed_count(), 3);
        let failed = job.piece(1).unwrap();
        assert_eq!(failed.status, PieceStatus::Failed);
        assert_eq!(failed.error.as_ref().unwrap().kind, PieceFailureKind::Terminal);
        assert_eq!(job.piece(2).unwrap().status, PieceStatus::Done);
    }

    #[tokio::test]
    async fn compose_off_returns_per_piece_results_without_compose_call() {
        let mut compose = MockComposePort::new();
        compose.expect_compose().never();
        let orchestrator = orchestrator(Arc::new(succeeding_port()), compose);
        let mut job = BatchJob::new(look(2), Some("me.png".into()), false, Utc::now());

        orchestrator
            .run(&mut job, &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(
            job.artifact(),
            Some(&BatchArtifact::Pieces {
                pieces: job.piece_results()
            })
        );
    }

    #[tokio::test]
    async fn compose_failure_degrades_to_pieces() {
        let mut compose = MockComposePort::new();
        compose
            .expect_compose()
            .times(1)
            .returning(|_| Err(ComposeError::Failed("pose mismatch".into())));
        let orchestrator = orchestrator(Arc::new(succeeding_port()), compose);
        let mut job = BatchJob::new(look(2), Some("me.png".into()), true, Utc::now());

        let status = orchestrator
            .run(&mut job, &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(status, BatchStatus::Completed);
        assert!(job.compose_error().unwrap().contains("pose mismatch"));
        assert_eq!(job.artifact().unwrap().merged_image_ref(), None);
        assert_eq!(job.artifact().unwrap().pieces().len(), 2);
    }

    #[tokio::test]
    async fn no_successful_pieces_skips_compose() {
        let mut port = MockGenerationPort::new();
        port.expect_submit()
            .returning(|_| Err(GenerationError::transient("HTTP 503")));
        let mut compose = MockComposePort::new();
        compose.expect_compose().never();
        let orchestrator = orchestrator(Arc::new(port), compose);
        let mut job = BatchJob::new(look(2), Some("me.png".into()), true, Utc::now());

        let status = orchestrator
            .run(&mut job, &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(status, BatchStatus::Completed);
        assert_eq!(job.failed_count(), 2);
        assert!(job.artifact().unwrap().pieces().is_empty());
    }

    /// Cancels the token while the request for piece `cancel_at` is in flight.
    struct CancellingPort {
        cancel: CancellationToken,
        cancel_at: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerationPort for CancellingPort {
        async fn submit(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationOutput, GenerationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == self.cancel_at {
                self.cancel.cancel();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Ok(GenerationOutput {
                result_image_ref: format!("fit-{}", request.garment_image_ref),
            })
        }

        async fn check_health(&self) -> Result<bool, GenerationError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn cancel_during_piece_records_it_and_starts_nothing_after() {
        let cancel = CancellationToken::new();
        let port = Arc::new(CancellingPort {
            cancel: cancel.clone(),
            cancel_at: 1,
            calls: AtomicUsize::new(0),
        });
        let mut compose = MockComposePort::new();
        compose.expect_compose().never();
        let orchestrator = orchestrator(port.clone(), compose);
        let mut job = BatchJob::new(look(4), Some("me.png".into()), true, Utc::now());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let status = orchestrator.run(&mut job, &cancel, Some(&tx)).await.unwrap();

        assert_eq!(status, BatchStatus::Cancelled);
        assert_eq!(port.calls.load(Ordering::SeqCst), 2);
        assert_eq!(job.piece(1).unwrap().status, PieceStatus::Done);
        for index in 2..4 {
            let piece = job.piece(index).unwrap();
            assert_eq!(piece.status, PieceStatus::Failed);
            assert_eq!(piece.error.as_ref().unwrap().kind, PieceFailureKind::Cancelled);
        }
        assert_eq!(job.completed_count(), 4);

        let last = drain(&mut rx).pop().unwrap();
        assert_eq!(last.status, BatchStatus::Cancelled);
        assert_eq!(last.completed, last.total);
    }

    #[tokio::test]
    async fn cancel_before_start_runs_no_piece() {
        let mut port = MockGenerationPort::new();
        port.expect_submit().never();
        let orchestrator = orchestrator(Arc::new(port), MockComposePort::new());
        let mut job = BatchJob::new(look(2), Some("me.png".into()), false, Utc::now());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let status = orchestrator.run(&mut job, &cancel, None).await.unwrap();

        assert_eq!(status, BatchStatus::Cancelled);
        assert_eq!(job.failed_count(), 2);
    }

    struct HangingPort;

    #[async_trait]
    impl GenerationPort for HangingPort {
        async fn submit(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationOutput, GenerationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(GenerationError::terminal("unreachable"))
        }

        async fn check_health(&self) -> Result<bool, GenerationError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn timed_out_piece_is_a_transient_failure() {
        let clock = clock();
        let orchestrator = BatchOrchestrator::new(
            Arc::new(GenerationClient::new(
                Arc::new(HangingPort),
                clock.clone(),
                Duration::from_millis(20),
            )),
            Arc::new(ComposeStep::new(
                Arc::new(MockComposePort::new()),
                Duration::from_secs(1),
            )),
            clock,
            false,
        );
        let mut job = BatchJob::new(look(1), Some("me.png".into()), false, Utc::now());

        let status = orchestrator
            .run(&mut job, &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(status, BatchStatus::Completed);
        let piece = job.piece(0).unwrap();
        assert_eq!(piece.error.as_ref().unwrap().kind, PieceFailureKind::Transient);
    }

    #[tokio::test]
    async fn job_runs_only_once() {
        let orchestrator = orchestrator(Arc::new(succeeding_port()), MockComposePort::new());
        let mut job = BatchJob::new(look(1), Some("me.png".into()), false, Utc::now());
        orchestrator
            .run(&mut job, &CancellationToken::new(), None)
            .await
            .unwrap();

        let err = orchestrator
            .run(&mut job, &CancellationToken::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::AlreadyStarted(BatchStatus::Completed)));
    }
}
