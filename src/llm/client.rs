use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{Completion, CompletionRequest};
use crate::config::{OpenAiConfig, RequestConfig};
use crate::error::{CompletionError, CompletionResult};

/// A chat-completion endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion request.
    async fn complete(&self, request: CompletionRequest) -> CompletionResult<Completion>;
}

/// Client for the OpenAI Responses API
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    request_config: RequestConfig,
}

#[derive(Serialize)]
struct ResponsesBody<'a> {
    model: &'a str,
    #[serde(flatten)]
    request: &'a CompletionRequest,
}

impl OpenAiClient {
    /// Create a new Responses API client
    pub fn new(config: &OpenAiConfig, request_config: RequestConfig) -> CompletionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(CompletionError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            request_config,
        })
    }

    /// Execute a single request (internal)
    async fn execute_request(
        &self,
        url: &str,
        request: &CompletionRequest,
    ) -> CompletionResult<Completion> {
        debug!(
            model = %self.model,
            input_items = request.input.len(),
            tools = request.tools.len(),
            "Calling completion endpoint"
        );

        let body = ResponsesBody {
            model: &self.model,
            request,
        };

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    CompletionError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json::<Completion>()
            .await
            .map_err(|e| CompletionError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> CompletionResult<Completion> {
        let url = format!("{}/v1/responses", self.base_url);

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying completion request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, &request).await {
                Ok(completion) => {
                    info!(
                        response_id = %completion.id,
                        latency_ms = start.elapsed().as_millis(),
                        "Completion call succeeded"
                    );
                    return Ok(completion);
                }
                Err(e) if !is_retryable(&e) => {
                    error!(error = %e, "Completion call failed permanently");
                    return Err(e);
                }
                Err(e) => {
                    error!(
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Completion call failed"
                    );
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(CompletionError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }
}

/// Client errors other than 408/429 and unparseable bodies are final.
fn is_retryable(error: &CompletionError) -> bool {
    match error {
        CompletionError::Api { status, .. } => {
            !(400..500).contains(status) || *status == 408 || *status == 429
        }
        CompletionError::InvalidResponse { .. } => false,
        _ => true,
    }
}
