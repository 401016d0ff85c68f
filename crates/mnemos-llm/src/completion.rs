//! Completion service interface.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message returned inside a completion choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// One generated alternative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Choice {
    pub message: ChatMessage,
}

/// Token usage reported by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: usize,
    #[serde(default)]
    pub completion_tokens: usize,
    #[serde(default)]
    pub total_tokens: usize,
}

/// Completion result. Only the first choice is consumed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Usage,
}

impl CompletionResponse {
    /// Build a single-choice response.
    pub fn single(content: impl Into<String>, total_tokens: usize) -> Self {
        Self {
            choices: vec![Choice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content: content.into(),
                },
            }],
            usage: Usage {
                total_tokens,
                ..Usage::default()
            },
        }
    }

    /// Content of the first choice.
    pub fn first_content(&self) -> Result<&str, LlmError> {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or(LlmError::EmptyResponse)
    }
}

/// Generates text for a prompt.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn run(&self, max_output_tokens: usize, prompt: &str)
    -> Result<CompletionResponse, LlmError>;
}
