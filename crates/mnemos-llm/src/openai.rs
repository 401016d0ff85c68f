//! OpenAI-compatible chat completion client.

use crate::completion::{ChatMessage, Choice, CompletionResponse, CompletionService, Usage};
use crate::error::LlmError;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat completion client for OpenAI and API-compatible servers.
#[derive(Debug, Clone)]
pub struct OpenAiCompletionService {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiCompletionService {
    /// Create a client for `model` with a request timeout.
    pub fn new(model: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: None,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Set the bearer token. Local servers often need none.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set custom base URL (for API-compatible services).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    max_tokens: usize,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl From<OpenAiResponse> for CompletionResponse {
    fn from(response: OpenAiResponse) -> Self {
        Self {
            choices: response
                .choices
                .into_iter()
                .map(|choice| Choice {
                    message: ChatMessage {
                        role: choice.message.role.unwrap_or_default(),
                        content: choice.message.content.unwrap_or_default(),
                    },
                })
                .collect(),
            usage: response.usage.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletionService {
    async fn run(
        &self,
        max_output_tokens: usize,
        prompt: &str,
    ) -> Result<CompletionResponse, LlmError> {
        let request = OpenAiRequest {
            model: &self.model,
            messages: vec![OpenAiMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: max_output_tokens,
        };

        debug!(
            "sending completion request (model={}, max_tokens={}, prompt_bytes={})",
            self.model,
            max_output_tokens,
            prompt.len()
        );
        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }
        let response = builder.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("completion backend rate limited (model={})", self.model);
            return Err(LlmError::RateLimited(body));
        }
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OpenAiResponse = serde_json::from_str(&body)?;
        let response = CompletionResponse::from(parsed);
        if response.choices.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        debug!(
            "completion received (model={}, total_tokens={})",
            self.model, response.usage.total_tokens
        );
        Ok(response)
    }
}
