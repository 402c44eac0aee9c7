// advisor-service-rs/src/llm_client.rs
//
// HTTP Client for interacting with LLM providers (OpenAI-compatible API)
//
// One chat completion per call. There is no retry and no backoff: a failed
// call is reported to the caller, which turns it into an in-band error.
//
// Configuration (.env file):
// - LLM_API_KEY / OPENAI_API_KEY: API key for the LLM provider
// - LLM_API_URL: API endpoint URL (defaults to OpenAI chat completions)
// - LLM_MODEL: Model to use (default "gpt-3.5-turbo")
// - LLM_MAX_TOKENS: Optional completion token cap
// - LLM_TIMEOUT_SECS: Request timeout in seconds (default: 60)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::settings::LlmSettings;

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

// Custom error type for LLM client operations
#[derive(Debug, Error)]
pub enum LLMError {
    // 400, 401, 403, 404 and a missing API key
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
    // 500, 502, 503, 504
    #[error("Server error: {0}")]
    ServerError(String),
    // Connection issues, timeouts, network failures
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Unknown error: {0}")]
    UnknownError(String),
    #[error("Client configuration error: {0}")]
    Configuration(String),
}

/// A backend able to answer a system + user chat exchange.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Whether a credential is available. Callers check this before any
    /// network I/O.
    fn is_configured(&self) -> bool;

    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, LLMError>;
}

#[derive(Debug, Clone)]
pub struct LLMClient {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    max_tokens: Option<u32>,
}

impl LLMClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, LLMError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| LLMError::Configuration(e.to_string()))?;

        if settings.api_key.is_none() {
            log::warn!("LLM API key is not configured; recommendations will report an error");
        }
        log::info!(
            "LLM client initialized (url: {}, model: {})",
            settings.api_url,
            settings.model
        );

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            api_url: settings.api_url.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        })
    }

    async fn execute_request(
        &self,
        api_key: &str,
        request_body: &ChatCompletionRequest,
    ) -> Result<String, LLMError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(request_body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    LLMError::NetworkError(format!("Request timed out: {}", err))
                } else if err.is_connect() {
                    LLMError::NetworkError(format!("Connection failed: {}", err))
                } else {
                    LLMError::NetworkError(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                400 | 401 | 403 | 404 => LLMError::InvalidRequest(format!("{}: {}", status, text)),
                429 => LLMError::RateLimitExceeded(format!("{}: {}", status, text)),
                500 | 502 | 503 | 504 => LLMError::ServerError(format!("{}: {}", status, text)),
                _ => LLMError::UnknownError(format!("{}: {}", status, text)),
            });
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| LLMError::ParseError(format!("Failed to parse response: {}", err)))?;

        if let Some(usage) = &data.usage {
            log::info!("LLM request completed. Used {} tokens", usage.total_tokens);
        }

        data.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LLMError::ParseError("No choices returned in response".to_string()))
    }
}

#[async_trait]
impl ChatCompletion for LLMClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, LLMError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LLMError::InvalidRequest("API key is not set".to_string()))?;

        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::new("system", system_prompt),
                ChatMessage::new("user", prompt),
            ],
            max_tokens: self.max_tokens,
        };

        log::info!(
            "Sending LLM request to {} (model: {})",
            self.api_url,
            self.model
        );

        self.execute_request(api_key, &request_body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer, api_key: Option<&str>) -> LlmSettings {
        LlmSettings {
            api_key: api_key.map(str::to_string),
            api_url: format!("{}/v1/chat/completions", server.uri()),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: None,
            timeout_secs: 5,
            service_name: "OpenAI".to_string(),
        }
    }

    #[tokio::test]
    async fn test_complete_sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hi there"}}],
                "usage": {"total_tokens": 12}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LLMClient::new(&settings_for(&server, Some("sk-test"))).unwrap();
        assert!(client.is_configured());
        let text = client.complete("be brief", "hello").await.unwrap();
        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn test_status_codes_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = LLMClient::new(&settings_for(&server, Some("sk-test"))).unwrap();
        let err = client.complete("s", "p").await.unwrap_err();
        assert!(matches!(err, LLMError::RateLimitExceeded(_)));
        assert!(err.to_string().contains("slow down"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = LLMClient::new(&settings_for(&server, Some("sk-test"))).unwrap();
        let err = client.complete("s", "p").await.unwrap_err();
        assert!(matches!(err, LLMError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_missing_key_never_calls_remote() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = LLMClient::new(&settings_for(&server, None)).unwrap();
        assert!(!client.is_configured());
        let err = client.complete("s", "p").await.unwrap_err();
        assert!(matches!(err, LLMError::InvalidRequest(_)));
    }
}
