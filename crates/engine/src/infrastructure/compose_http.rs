//! HTTP client for the look compose service
//!
//! Implements the ComposePort trait. Compose is best effort, so every failure
//! maps onto one of three coarse variants.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::infrastructure::ports::{ComposeError, ComposePort, ComposeRequest};

#[derive(Clone)]
pub struct HttpComposeClient {
    client: Client,
    base_url: String,
}

impl HttpComposeClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ComposePort for HttpComposeClient {
    async fn compose(&self, request: ComposeRequest) -> Result<String, ComposeError> {
        tracing::debug!(
            pieces = request.ordered_image_refs.len(),
            label = %request.label,
            "Submitting compose request"
        );

        let response = self
            .client
            .post(format!("{}/compose", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ComposeError::Unavailable
                } else {
                    ComposeError::Failed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ComposeError::Failed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text.trim()
            )));
        }

        let reply: ComposeResponseBody = response
            .json()
            .await
            .map_err(|e| ComposeError::Failed(format!("undecodable response: {}", e)))?;

        merged_ref(reply)
    }
}

fn merged_ref(reply: ComposeResponseBody) -> Result<String, ComposeError> {
    match reply.merged_image_ref {
        Some(merged) if !merged.trim().is_empty() => Ok(merged),
        _ => Err(ComposeError::Failed(
            reply
                .error
                .unwrap_or_else(|| "no merged image returned".to_string()),
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComposeResponseBody {
    merged_image_ref: Option<String>,
    error: Option<String>,
}
