//! Provider for OpenAI-compatible chat completion endpoints.
//!
//! Any service speaking the `/chat/completions` protocol works: OpenAI itself,
//! or a compatible gateway selected through `advisory.base_url`. The brain's
//! deadline bounds every call; this provider adds no retry of its own.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{DecisionProvider, ProviderError, ProviderRequest};

/// Connection settings for [`OpenAiProvider`].
#[derive(Clone, PartialEq, Eq)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub model: String,
    /// Endpoint root without the trailing `/chat/completions`.
    pub base_url: String,
}

impl std::fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Remote advisor over HTTP.
pub struct OpenAiProvider {
    settings: OpenAiSettings,
    endpoint: String,
    http_client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a provider for `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unavailable`] when the API key is empty or
    /// the HTTP client cannot be created.
    pub fn new(settings: OpenAiSettings) -> Result<Self, ProviderError> {
        if settings.api_key.trim().is_empty() {
            return Err(ProviderError::Unavailable("OPENAI_API_KEY is not set".into()));
        }
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|error| ProviderError::Unavailable(error.to_string()))?;
        let endpoint = format!("{}/chat/completions", settings.base_url.trim_end_matches('/'));
        Ok(Self {
            settings,
            endpoint,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }
}

fn chat_request<'a>(model: &'a str, request: &'a ProviderRequest) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [
            ChatMessage {
                role: "system",
                content: &request.system_prompt,
            },
            ChatMessage {
                role: "user",
                content: &request.user_prompt,
            },
        ],
        temperature: 0.7,
        max_tokens: 200,
    }
}

/// Pull the first choice's text out of a completion response.
fn first_content(response: ChatResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::Transport("completion has no content".into()))
}

#[async_trait]
impl DecisionProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn decide(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        let transport = |error: reqwest::Error| ProviderError::Transport(error.to_string());

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&chat_request(&self.settings.model, request))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable body".to_owned());
            return Err(ProviderError::Transport(format!(
                "completion failed with status {status}: {body}"
            )));
        }

        let completion: ChatResponse = response.json().await.map_err(transport)?;
        first_content(completion)
    }
}
