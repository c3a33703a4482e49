//! Application state and composition.

use std::sync::Arc;

use tryon_domain::{BatchJob, GarmentSelection, TryOnConfig};

use crate::entities::{ComposeStep, GenerationClient};
use crate::infrastructure::ports::{ClockPort, ComposePort, GenerationPort, ResultRepo};
use crate::use_cases::{BatchOrchestrator, TryOnSession};

/// Main application state.
///
/// Holds the shared entity wrappers and use cases. Sessions are created per
/// user and own their own result set and retry state.
pub struct App {
    pub config: TryOnConfig,
    pub clock: Arc<dyn ClockPort>,
    pub generation: Arc<GenerationClient>,
    pub results: Arc<dyn ResultRepo>,
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub batch: Arc<BatchOrchestrator>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        generation_port: Arc<dyn GenerationPort>,
        compose_port: Arc<dyn ComposePort>,
        results: Arc<dyn ResultRepo>,
        clock: Arc<dyn ClockPort>,
        config: TryOnConfig,
    ) -> Self {
        let generation = Arc::new(GenerationClient::new(
            generation_port,
            clock.clone(),
            config.request_timeout(),
        ));
        let compose = Arc::new(ComposeStep::new(compose_port, config.compose_timeout()));

        let batch = Arc::new(BatchOrchestrator::new(
            generation.clone(),
            compose,
            clock.clone(),
            config.demo_mode(),
        ));

        Self {
            config,
            clock,
            generation,
            results,
            use_cases: UseCases { batch },
        }
    }

    /// Start an interactive session for one user.
    pub fn new_session(&self) -> TryOnSession {
        TryOnSession::new(
            self.generation.clone(),
            self.results.clone(),
            self.clock.clone(),
            &self.config,
        )
    }

    /// Create an idle batch job stamped with the app clock.
    pub fn new_batch_job(
        &self,
        pieces: Vec<GarmentSelection>,
        avatar_ref: Option<String>,
        compose_mode: bool,
    ) -> BatchJob {
        BatchJob::new(pieces, avatar_ref, compose_mode, self.clock.now())
    }
}
