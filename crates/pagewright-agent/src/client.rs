//! Generation service client
//!
//! Key design: the client is a dumb transport. One call to
//! [`GenerationClient::complete`] is exactly one outbound request. No retries,
//! no caching and no inspection of the returned text; retry policy and
//! output validation belong to the caller.

use async_trait::async_trait;
use pagewright_core::{GenerationConfig, GenerationFailure, PagewrightError, Result};
use reqwest::StatusCode;
use std::time::Duration;

use crate::auth;
use crate::types::{GenerateContentRequest, GenerateContentResponse, Model};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Boundary to an external generative text service
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Send one request and return the raw response text
    async fn complete(&self, request: &str) -> std::result::Result<String, GenerationFailure>;
}

/// Gemini `generateContent` client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: Model,
    base_url: String,
    temperature: f32,
    max_output_tokens: u32,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new client with default settings
    pub fn new(api_key: impl Into<String>, model: Model) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Build a client from configuration, reading the API key from the environment
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let model: Model = config.model.parse().map_err(PagewrightError::Config)?;
        let api_key = auth::get_api_key(&config.api_key_env)?;

        Ok(Self::new(api_key, model)
            .with_base_url(&config.base_url)
            .with_temperature(config.temperature)
            .with_max_output_tokens(config.max_output_tokens)
            .with_timeout(config.timeout()))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Per-request timeout enforced by the HTTP layer
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> Model {
        self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url,
            self.model.api_name()
        )
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn complete(&self, request: &str) -> std::result::Result<String, GenerationFailure> {
        tracing::debug!(
            "Sending {} char request to {} ({})",
            request.len(),
            self.model,
            self.model.api_name()
        );

        let body =
            GenerateContentRequest::user_text(request, self.temperature, self.max_output_tokens);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(failure_for_transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown".to_string());
            tracing::warn!("Generation service returned {}", status);
            return Err(failure_for_status(status, &error_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationFailure::Timeout
            } else {
                GenerationFailure::Unknown(format!("Failed to parse response: {}", e))
            }
        })?;

        let output = parsed.first_text().ok_or_else(|| match parsed.finish_reason() {
            Some(reason) => {
                GenerationFailure::Unknown(format!("No content in response (finish reason {})", reason))
            }
            None => GenerationFailure::Unknown("No content in response".to_string()),
        })?;

        if parsed.finish_reason() == Some("MAX_TOKENS") {
            tracing::warn!(
                "Generation stopped at the output token limit ({} tokens); the document may be cut off",
                self.max_output_tokens
            );
        }

        match parsed.usage_metadata {
            Some(usage) => tracing::info!(
                "Generation complete ({} chars, {} prompt tokens, {} output tokens)",
                output.len(),
                usage.prompt_token_count,
                usage.candidates_token_count
            ),
            None => tracing::info!("Generation complete ({} chars)", output.len()),
        }

        Ok(output)
    }
}

/// Map a non-success HTTP status onto the failure taxonomy
pub fn failure_for_status(status: StatusCode, body: &str) -> GenerationFailure {
    match status {
        StatusCode::TOO_MANY_REQUESTS => GenerationFailure::QuotaExceeded,
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => GenerationFailure::ServiceUnavailable,
        _ => GenerationFailure::Unknown(format!("Generation API error {}: {}", status, body)),
    }
}

fn failure_for_transport(error: reqwest::Error) -> GenerationFailure {
    if error.is_timeout() {
        GenerationFailure::Timeout
    } else {
        GenerationFailure::Unknown(format!("Failed to send request: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/models/gemini-1.5-flash:generateContent";

    fn success_body(text: &str) -> String {
        serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 34}
        })
        .to_string()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            failure_for_status(StatusCode::TOO_MANY_REQUESTS, ""),
            GenerationFailure::QuotaExceeded
        );
        assert_eq!(
            failure_for_status(StatusCode::SERVICE_UNAVAILABLE, ""),
            GenerationFailure::ServiceUnavailable
        );
        assert_eq!(
            failure_for_status(StatusCode::BAD_GATEWAY, ""),
            GenerationFailure::ServiceUnavailable
        );
        assert!(matches!(
            failure_for_status(StatusCode::BAD_REQUEST, "bad"),
            GenerationFailure::Unknown(msg) if msg.contains("400")
        ));
    }

    #[test]
    fn test_client_builder() {
        let client = GeminiClient::new("key", Model::Pro)
            .with_base_url("http://localhost:9999/")
            .with_temperature(0.2)
            .with_max_output_tokens(1000)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(client.model(), Model::Pro);
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/models/gemini-1.5-pro:generateContent"
        );
        assert_eq!(client.max_output_tokens, 1000);
        assert_eq!(client.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_config_rejects_unknown_model() {
        let config = GenerationConfig {
            model: "ultra".to_string(),
            ..GenerationConfig::default()
        };
        assert!(matches!(
            GeminiClient::from_config(&config),
            Err(PagewrightError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_returns_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(success_body("<!DOCTYPE html><html></html>"))
            .create_async()
            .await;

        let client = GeminiClient::new("test-key", Model::Flash).with_base_url(server.url());
        let output = client.complete("build a page").await.unwrap();

        assert_eq!(output, "<!DOCTYPE html><html></html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_maps_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(429)
            .with_body(r#"{"error": {"status": "RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new("test-key", Model::Flash).with_base_url(server.url());
        let err = client.complete("build a page").await.unwrap_err();
        assert_eq!(err, GenerationFailure::QuotaExceeded);
    }

    #[tokio::test]
    async fn test_complete_maps_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(503)
            .create_async()
            .await;

        let client = GeminiClient::new("test-key", Model::Flash).with_base_url(server.url());
        let err = client.complete("build a page").await.unwrap_err();
        assert_eq!(err, GenerationFailure::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_complete_makes_single_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let client = GeminiClient::new("test-key", Model::Flash).with_base_url(server.url());
        assert!(client.complete("build a page").await.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_candidates_is_unknown() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let client = GeminiClient::new("test-key", Model::Flash).with_base_url(server.url());
        assert!(matches!(
            client.complete("build a page").await,
            Err(GenerationFailure::Unknown(_))
        ));
    }

    #[tokio::test]
    async fn test_blocked_candidate_reports_finish_reason() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#)
            .create_async()
            .await;

        let client = GeminiClient::new("test-key", Model::Flash).with_base_url(server.url());
        let err = client.complete("build a page").await.unwrap_err();
        assert_eq!(
            err,
            GenerationFailure::Unknown("No content in response (finish reason SAFETY)".to_string())
        );
    }
}
