//! Progressive summarization of a session's older messages.
//!
//! Once a session accumulates `message_window` uncovered messages, every
//! message except the newest `message_window / 2` is folded into the running
//! summary. Folding packs message lines greedily into batches that fit the
//! model's input budget and asks the completion service to extend the summary
//! once per batch.

use crate::context::ExtractContext;
use crate::error::ExtractorError;
use crate::extractor::{Extractor, launch};
use crate::locks::SessionLocks;
use crate::prompt::PromptBuilder;
use crate::state::AppState;
use async_trait::async_trait;
use log::{debug, info};
use mnemos_config::SummarizerConfig;
use mnemos_llm::max_model_tokens;
use mnemos_memory::{Message, MessageEvent, Summary};
use std::sync::Arc;

/// Output cap for every summarization call.
pub const SUMMARY_MAX_OUTPUT_TOKENS: usize = 512;
/// Prompt overhead reserved when `prompt_tokens` is not configured.
pub const DEFAULT_PROMPT_TOKENS: usize = 250;

/// Extractor that compacts older messages into the session summary.
#[derive(Debug)]
pub struct SummaryExtractor {
    prompt: PromptBuilder,
    locks: SessionLocks,
}

/// Running summary text and the usage reported by the call that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Folded {
    content: String,
    token_count: usize,
}

impl SummaryExtractor {
    pub const NAME: &'static str = "summarizer";

    pub fn new(prompt: PromptBuilder) -> Self {
        Self {
            prompt,
            locks: SessionLocks::new(),
        }
    }

    /// Build from config, compiling a custom prompt template if one is set.
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, ExtractorError> {
        let prompt = PromptBuilder::from_config(config.prompt_template.as_deref())?;
        Ok(Self::new(prompt))
    }

    /// Fold all but the newest `message_window / 2` of `messages` into a new
    /// summary seeded with `prev_summary`.
    ///
    /// `messages` must be uncovered and oldest first. The returned summary
    /// points at the last folded message.
    pub async fn summarize(
        &self,
        ctx: &ExtractContext,
        state: &AppState,
        messages: &[Message],
        prev_summary: &str,
    ) -> Result<Summary, ExtractorError> {
        let keep = state.config.memory.message_window / 2;
        let to_summarize = &messages[..messages.len().saturating_sub(keep)];

        let model = state.config.llm.model.as_str();
        let max_tokens = max_model_tokens(model).ok_or_else(|| {
            ExtractorError::new(format!("model {model:?} not found in capacity table"))
        })?;
        let prompt_tokens = match state.config.extractors.summarizer.prompt_tokens {
            0 => DEFAULT_PROMPT_TOKENS,
            tokens => tokens,
        };
        let budget = max_tokens
            .checked_sub(SUMMARY_MAX_OUTPUT_TOKENS + prompt_tokens)
            .ok_or_else(|| {
                ExtractorError::new(format!(
                    "prompt_tokens {prompt_tokens} leaves no input budget for model {model:?}"
                ))
            })?;

        let folded = self
            .fold(ctx, state, to_summarize, prev_summary, budget)
            .await?;
        if folded.content.is_empty() {
            return Err(ExtractorError::new("completion produced an empty summary"));
        }
        let Some(summary_point) = to_summarize.last() else {
            return Err(ExtractorError::new("no messages to summarize"));
        };
        Ok(Summary::new(
            folded.content,
            folded.token_count,
            summary_point.uuid,
        ))
    }

    /// Greedy one-pass packing of message lines into budget-sized batches.
    ///
    /// A message is never split; one whose line alone exceeds `budget` is
    /// sent as a batch of its own.
    async fn fold(
        &self,
        ctx: &ExtractContext,
        state: &AppState,
        messages: &[Message],
        seed: &str,
        budget: usize,
    ) -> Result<Folded, ExtractorError> {
        if messages.is_empty() {
            return Err(ExtractorError::new("no messages to summarize"));
        }

        let mut summary = Folded {
            content: seed.to_string(),
            token_count: 0,
        };
        let mut lines: Vec<String> = Vec::new();
        let mut total = 0usize;
        for message in messages {
            let line = format!("{}: {}", message.role, message.content);
            let tokens = state
                .tokenizer
                .count(&line)
                .map_err(|err| ExtractorError::with_cause("failed to count message tokens", err))?;
            if !lines.is_empty() && total + tokens > budget {
                summary = self.flush(ctx, state, &summary.content, &lines).await?;
                lines.clear();
                total = 0;
            }
            lines.push(line);
            total += tokens;
        }
        if !lines.is_empty() {
            summary = self.flush(ctx, state, &summary.content, &lines).await?;
        }
        Ok(summary)
    }

    /// One completion call extending `prev_summary` with `lines`.
    async fn flush(
        &self,
        ctx: &ExtractContext,
        state: &AppState,
        prev_summary: &str,
        lines: &[String],
    ) -> Result<Folded, ExtractorError> {
        let prompt = self.prompt.render(prev_summary, &lines.join("\n"))?;
        debug!(
            "summarizing batch (lines={}, prompt_bytes={})",
            lines.len(),
            prompt.len()
        );
        let response = ctx
            .run(
                "calling completion service",
                state.completion.run(SUMMARY_MAX_OUTPUT_TOKENS, &prompt),
            )
            .await?
            .map_err(|err| ExtractorError::with_cause("summary completion failed", err))?;
        let content = response
            .first_content()
            .map_err(|err| ExtractorError::with_cause("summary completion failed", err))?;
        Ok(Folded {
            content: content.trim().to_string(),
            token_count: response.usage.total_tokens,
        })
    }
}

#[async_trait]
impl Extractor for SummaryExtractor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn extract(
        &self,
        ctx: &ExtractContext,
        state: &AppState,
        event: &MessageEvent,
    ) -> Result<(), ExtractorError> {
        let window = state.config.memory.message_window;
        if window == 0 {
            return Err(ExtractorError::new(
                "memory.message_window must be greater than zero",
            ));
        }
        let session_id = event.session_id.as_str();
        let _guard = ctx
            .run("waiting for session lock", self.locks.lock(session_id))
            .await?;

        let memory = ctx
            .run("reading memory", state.store.get_memory(session_id, 0))
            .await?
            .map_err(|err| {
                ExtractorError::with_cause(
                    format!("failed to read memory (session_id={session_id})"),
                    err,
                )
            })?;
        let Some(messages) = memory.messages else {
            return Err(ExtractorError::new(format!(
                "store returned no messages (session_id={session_id})"
            )));
        };
        if messages.len() < window {
            debug!(
                "below summarization threshold (session_id={}, uncovered={}, window={})",
                session_id,
                messages.len(),
                window
            );
            return Ok(());
        }

        let prev_summary = memory
            .summary
            .as_ref()
            .map(|summary| summary.content.as_str())
            .unwrap_or_default();
        let summary = self
            .summarize(ctx, state, &messages, prev_summary)
            .await
            .map_err(|err| {
                ExtractorError::with_cause(
                    format!("failed to summarize (session_id={session_id})"),
                    err,
                )
            })?;

        let summary_point = summary.summary_point_uuid;
        let token_count = summary.token_count;
        ctx.run("writing summary", state.store.put_summary(session_id, summary))
            .await?
            .map_err(|err| {
                ExtractorError::with_cause(
                    format!("failed to write summary (session_id={session_id})"),
                    err,
                )
            })?;
        info!(
            "summary updated (session_id={}, summary_point_uuid={}, token_count={})",
            session_id, summary_point, token_count
        );
        Ok(())
    }

    fn notify(
        self: Arc<Self>,
        ctx: ExtractContext,
        state: Arc<AppState>,
        event: Option<MessageEvent>,
    ) -> Result<(), ExtractorError> {
        launch(self, ctx, state, event)
    }
}
