//! Compose entity operations.

use std::sync::Arc;
use std::time::Duration;

use tryon_domain::GenerationResult;

use crate::infrastructure::ports::{ComposeError, ComposePort, ComposeRequest};

/// Merges the successful pieces of a look into one image.
///
/// One call per invocation, bounded by the compose timeout. No retries.
pub struct ComposeStep {
    port: Arc<dyn ComposePort>,
    timeout: Duration,
}

impl ComposeStep {
    pub fn new(port: Arc<dyn ComposePort>, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    /// Returns the merged image reference.
    pub async fn run(
        &self,
        avatar_ref: &str,
        pieces: &[GenerationResult],
        label: &str,
    ) -> Result<String, ComposeError> {
        let request = ComposeRequest {
            avatar_ref: avatar_ref.to_string(),
            ordered_image_refs: pieces
                .iter()
                .map(|r| r.result_image_ref().to_string())
                .collect(),
            label: label.to_string(),
        };

        tokio::time::timeout(self.timeout, self.port.compose(request))
            .await
            .map_err(|_| ComposeError::Timeout(self.timeout.as_secs()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockComposePort;
    use chrono::{TimeZone, Utc};
    use tryon_domain::ModelTier;

    fn result(name: &str) -> GenerationResult {
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        GenerationResult::completed(name, "g.png", ModelTier::BASELINE, 1, now)
    }

    #[tokio::test]
    async fn passes_refs_in_piece_order() {
        let mut port = MockComposePort::new();
        port.expect_compose()
            .times(1)
            .withf(|req| {
                req.ordered_image_refs == vec!["top.png".to_string(), "pants.png".to_string()]
                    && req.avatar_ref == "me.png"
                    && req.label == "Weekend"
            })
            .returning(|_| Ok("look.png".into()));

        let step = ComposeStep::new(Arc::new(port), Duration::from_secs(5));
        let merged = step
            .run("me.png", &[result("top.png"), result("pants.png")], "Weekend")
            .await
            .unwrap();
        assert_eq!(merged, "look.png");
    }

    #[tokio::test]
    async fn failure_is_returned_once() {
        let mut port = MockComposePort::new();
        port.expect_compose()
            .times(1)
            .returning(|_| Err(ComposeError::Unavailable));

        let step = ComposeStep::new(Arc::new(port), Duration::from_secs(5));
        let err = step.run("me.png", &[result("a.png")], "Look").await.unwrap_err();
        assert_eq!(err, ComposeError::Unavailable);
    }
}
