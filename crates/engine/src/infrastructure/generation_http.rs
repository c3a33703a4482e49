//! HTTP client for the garment fitting service
//!
//! Implements the GenerationPort trait. Every failure is classified here as
//! transient or terminal so callers never look at status codes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{
    GenerationError, GenerationOutput, GenerationPort, GenerationRequest,
};

/// Client for the generation service API
#[derive(Clone)]
pub struct HttpGenerationClient {
    client: Client,
    base_url: String,
}

impl HttpGenerationClient {
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
impl GenerationPort for HttpGenerationClient {
    async fn submit(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError> {
        let body = TryOnRequestBody::from(&request);

        tracing::debug!(
            tier = %request.model_tier,
            attempt = request.attempt_index,
            category = %request.category,
            "Submitting try-on request"
        );

        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status, &error_text));
        }

        let reply: TryOnResponseBody = response
            .json()
            .await
            .map_err(|e| GenerationError::terminal(format!("undecodable response: {}", e)))?;

        interpret_reply(reply)
    }

    async fn check_health(&self) -> Result<bool, GenerationError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| GenerationError::transient(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

/// Map a non-success HTTP status to an error class.
///
/// 408, 429 and 5xx are retryable; every other 4xx (invalid image, quota) is not.
fn classify_status(status: StatusCode, body: &str) -> GenerationError {
    let message = format!("HTTP {}: {}", status.as_u16(), body.trim());
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        GenerationError::transient(message)
    } else {
        GenerationError::terminal(message)
    }
}

fn classify_transport_error(error: reqwest::Error) -> GenerationError {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        GenerationError::transient(error.to_string())
    } else {
        GenerationError::terminal(error.to_string())
    }
}

/// `success:false`, or `success:true` without an image, is terminal whatever
/// the transport said.
fn interpret_reply(reply: TryOnResponseBody) -> Result<GenerationOutput, GenerationError> {
    if !reply.success {
        return Err(GenerationError::terminal(
            reply
                .error
                .unwrap_or_else(|| "service reported failure".to_string()),
        ));
    }
    match reply.result_image_url {
        Some(url) if !url.trim().is_empty() => Ok(GenerationOutput {
            result_image_ref: url,
        }),
        _ => Err(GenerationError::terminal(
            "service reported success without a result image",
        )),
    }
}

// =============================================================================
// Service API types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TryOnRequestBody<'a> {
    avatar_image_url: &'a str,
    garment_image_url: &'a str,
    category: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    demo_mode: bool,
    model_tier: u8,
}

impl<'a> From<&'a GenerationRequest> for TryOnRequestBody<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            avatar_image_url: &request.avatar_image_ref,
            garment_image_url: &request.garment_image_ref,
            category: request.category.as_str(),
            demo_mode: request.demo_mode,
            model_tier: request.model_tier.value(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TryOnResponseBody {
    success: bool,
    result_image_url: Option<String>,
    error: Option<String>,
}
