//! HTTP chat-completions provider with rate limiting

use super::{completion_failed, invalid_response};
use crate::{ChatMessage, CompletionProvider, CompletionRequest, CompletionResponse, FALLBACK_MODEL};
use async_trait::async_trait;
use quorum_core::QuorumResult;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: i64,
    #[serde(default)]
    completion_tokens: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorDetail {
    message: String,
}

// ============================================================================
// PROVIDER
// ============================================================================

/// Chat-completions client with rate limiting.
///
/// Posts OpenAI-shaped JSON to a configured endpoint and surfaces the
/// HTTP status and error body on failure. Requests are spaced to respect
/// a requests-per-minute budget; failures are never retried here.
pub struct HttpCompletionProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    default_model: String,
    rate_limiter: Arc<Semaphore>,
    last_request: Arc<AtomicU64>,
    min_request_interval_ms: u64,
    start_time: Instant,
}

impl HttpCompletionProvider {
    /// Create a new HTTP completion provider.
    ///
    /// # Arguments
    /// * `endpoint` - Full chat-completions URL, e.g. "https://host/chat/completions"
    /// * `api_key` - Bearer token for the service
    /// * `requests_per_minute` - Maximum requests per minute (minimum: 1)
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        requests_per_minute: u32,
    ) -> Self {
        let rpm = requests_per_minute.max(1);
        let permits = rpm as usize;
        let min_interval_ms = (60_000 / rpm as u64).max(10);

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            default_model: FALLBACK_MODEL.to_string(),
            rate_limiter: Arc::new(Semaphore::new(permits)),
            last_request: Arc::new(AtomicU64::new(0)),
            min_request_interval_ms: min_interval_ms,
            start_time: Instant::now(),
        }
    }

    /// Override the model substituted when a request omits one.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, request: &CompletionRequest) -> QuorumResult<CompletionResponse> {
        let model = if request.model_id.is_empty() {
            self.default_model.as_str()
        } else {
            request.model_id.as_str()
        };

        // Rate limiting: acquire permit
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| completion_failed(model, format!("Rate limiter error: {}", e)))?;

        // Enforce minimum interval between requests
        let now_ms = self.start_time.elapsed().as_millis() as u64;
        let last_ms = self.last_request.load(Ordering::Relaxed);
        let elapsed = now_ms.saturating_sub(last_ms);

        if elapsed < self.min_request_interval_ms {
            let wait_ms = self.min_request_interval_ms - elapsed;
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        }

        self.last_request.store(now_ms, Ordering::Relaxed);

        let body = ChatRequest {
            model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| completion_failed(model, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let retry_after_ms = parse_retry_after_ms(response.headers()).unwrap_or(0);

        if status.is_success() {
            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| invalid_response(model, format!("failed to parse body: {}", e)))?;

            let choice = parsed
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| invalid_response(model, "response contained no choices"))?;
            let usage = parsed.usage.unwrap_or_default();

            Ok(CompletionResponse {
                content: choice.message.content,
                model_id: model.to_string(),
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            })
        } else {
            // Parse error response
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let error_msg = if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                api_error.error.message
            } else {
                error_text
            };

            Err(match status {
                StatusCode::TOO_MANY_REQUESTS => completion_failed(
                    model,
                    format!("rate limited, retry after {}ms", retry_after_ms),
                ),
                _ => completion_failed(
                    model,
                    format!("HTTP {}: {}", status.as_u16(), error_msg),
                ),
            })
        }
    }

    fn model_id(&self) -> &str {
        &self.default_model
    }
}

fn parse_retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<i64> {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<f64>().ok())
        .map(|seconds| (seconds * 1000.0) as i64)
}

impl std::fmt::Debug for HttpCompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCompletionProvider")
            .field("endpoint", &self.endpoint)
            .field("default_model", &self.default_model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_fallback_model() {
        let provider = HttpCompletionProvider::new("https://host/chat/completions", "key", 60);
        assert_eq!(provider.model_id(), FALLBACK_MODEL);
    }

    #[test]
    fn default_model_override() {
        let provider = HttpCompletionProvider::new("https://host/chat/completions", "key", 60)
            .with_default_model("openrouter/openai/gpt-4o");
        assert_eq!(provider.model_id(), "openrouter/openai/gpt-4o");
    }

    #[test]
    fn debug_redacts_api_key() {
        let provider = HttpCompletionProvider::new("https://host/chat/completions", "sk-abc", 60);
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-abc"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn chat_request_serializes_openai_shape() {
        let messages = vec![ChatMessage::system("be terse"), ChatMessage::user("hello")];
        let body = ChatRequest {
            model: "test-model",
            messages: &messages,
            temperature: 0.7,
            max_tokens: 256,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["temperature"], 0.7);
        assert_eq!(value["max_tokens"], 256);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hello");
    }

    #[test]
    fn chat_response_parses_usage_and_content() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "done"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "done");
        let usage = parsed.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.completion_tokens, 4);
    }

    #[test]
    fn chat_response_tolerates_missing_usage() {
        let raw = r#"{"choices": [{"message": {"content": "ok"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.usage.is_none());
        assert_eq!(parsed.choices[0].message.content, "ok");
    }

    #[test]
    fn error_body_parses_message() {
        let raw = r#"{"error": {"message": "model overloaded", "type": "overloaded_error"}}"#;
        let parsed: ApiError = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.error.message, "model overloaded");
    }
}
