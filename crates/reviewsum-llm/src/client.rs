//! HTTP client for OpenAI-compatible chat-completion endpoints.
//!
//! Wraps `reqwest` with bearer authentication, a request timeout, and typed
//! response decoding. Non-2xx responses surface as [`GenerationError::Api`]
//! carrying the provider's error message when one is present.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};
use reviewsum_core::LlmSettings;

use crate::error::GenerationError;
use crate::types::{ApiErrorEnvelope, ChatRequest, ChatResponse};

/// Sends a chat request and returns the text of the first choice.
pub trait CompletionClient {
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// Client for the `OpenAI` chat-completions API.
///
/// Built from [`LlmSettings`] in production, or with
/// [`OpenAiClient::with_base_url`] to point at a mock in tests.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    endpoint: Url,
}

impl OpenAiClient {
    /// Creates a client from the loaded LLM settings.
    ///
    /// # Errors
    ///
    /// See [`OpenAiClient::with_base_url`].
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, GenerationError> {
        Self::with_base_url(
            &settings.api_key,
            settings.request_timeout_secs,
            &settings.base_url,
        )
    }

    /// Creates a client with a custom base URL.
    ///
    /// `base_url` may be the host root (`https://api.openai.com`) or already
    /// include the `/v1` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`GenerationError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("reviewsum/0.1 (review-summaries)")
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint: completions_endpoint(base_url)?,
        })
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map_or_else(|_| truncate(&body, 500).to_string(), |env| env.error.message);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| GenerationError::Deserialize {
                context: format!("chat completion ({})", request.model),
                source: e,
            })?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                model = %request.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyCompletion)
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send {
        self.send(request)
    }
}

fn completions_endpoint(base_url: &str) -> Result<Url, GenerationError> {
    let trimmed = base_url.trim_end_matches('/');
    let full = if trimmed.ends_with("/v1") {
        format!("{trimmed}/chat/completions")
    } else {
        format!("{trimmed}/v1/chat/completions")
    };
    Url::parse(&full).map_err(|e| GenerationError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}

fn truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
