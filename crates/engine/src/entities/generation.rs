//! Generation entity operations.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tryon_domain::GenerationResult;

use crate::infrastructure::ports::{ClockPort, GenerationError, GenerationPort, GenerationRequest};

/// Submits single garment fitting requests.
///
/// Validates input before touching the network, bounds every call with the
/// request timeout and turns the service reply into a `GenerationResult`.
pub struct GenerationClient {
    port: Arc<dyn GenerationPort>,
    clock: Arc<dyn ClockPort>,
    request_timeout: Duration,
}

impl GenerationClient {
    pub fn new(
        port: Arc<dyn GenerationPort>,
        clock: Arc<dyn ClockPort>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            port,
            clock,
            request_timeout,
        }
    }

    pub async fn submit(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        if request.avatar_image_ref.trim().is_empty() {
            return Err(GenerationError::invalid_input("avatar image reference is required"));
        }
        if request.garment_image_ref.trim().is_empty() {
            return Err(GenerationError::invalid_input("garment image reference is required"));
        }

        let tier = request.model_tier;
        let garment_image_ref = request.garment_image_ref.clone();
        let started = Instant::now();

        let output = tokio::time::timeout(self.request_timeout, self.port.submit(request))
            .await
            .map_err(|_| GenerationError::timed_out(self.request_timeout))??;

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(tier = %tier, duration_ms, "Generation completed");

        Ok(GenerationResult::completed(
            output.result_image_ref,
            garment_image_ref,
            tier,
            duration_ms,
            self.clock.now(),
        ))
    }

    /// Check if the generation service is reachable.
    pub async fn check_health(&self) -> Result<bool, GenerationError> {
        self.port.check_health().await
    }
}
