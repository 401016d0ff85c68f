use async_trait::async_trait;
use mnemos_llm::{CompletionResponse, CompletionService, LlmError, Tokenizer};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// One recorded call to a completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCall {
    pub max_output_tokens: usize,
    pub prompt: String,
}

/// Completion service replaying scripted results, then answering
/// `"summary <n>"` for the n-th call (1-based) with `total_tokens = 10 * n`.
#[derive(Clone, Default)]
pub struct ScriptedCompletion {
    script: Arc<Mutex<VecDeque<Result<CompletionResponse, LlmError>>>>,
    calls: Arc<Mutex<Vec<CompletionCall>>>,
    delay: Option<Duration>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the first calls with `contents`, in order.
    pub fn with_responses<I, S>(contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let completion = Self::new();
        for (idx, content) in contents.into_iter().enumerate() {
            completion.push(Ok(CompletionResponse::single(content, 100 + idx)));
        }
        completion
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, result: Result<CompletionResponse, LlmError>) {
        self.script.lock().push_back(result);
    }

    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn run(
        &self,
        max_output_tokens: usize,
        prompt: &str,
    ) -> Result<CompletionResponse, LlmError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let call_number = {
            let mut calls = self.calls.lock();
            calls.push(CompletionCall {
                max_output_tokens,
                prompt: prompt.to_string(),
            });
            calls.len()
        };
        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(CompletionResponse::single(
                format!("summary {call_number}"),
                10 * call_number,
            ))
        })
    }
}

/// Counts whitespace-separated words, so test budgets are easy to reason about.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn count(&self, text: &str) -> Result<usize, LlmError> {
        Ok(text.split_whitespace().count())
    }
}
