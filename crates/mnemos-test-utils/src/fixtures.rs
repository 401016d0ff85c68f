use mnemos_config::MnemosConfig;
use mnemos_extractors::{AppState, ReportSink, WorkerPool};
use mnemos_llm::{CompletionService, Tokenizer};
use mnemos_memory::{MemoryStore, Message};
use std::sync::Arc;

use crate::llm::WordTokenizer;

/// `count` alternating user/assistant messages with content `"message <idx>"`.
pub fn transcript(count: usize) -> Vec<Message> {
    (0..count)
        .map(|idx| {
            let role = if idx % 2 == 0 { "user" } else { "assistant" };
            Message::new(role, format!("message {idx}"))
        })
        .collect()
}

/// Config with the given window on the default model.
pub fn test_config(message_window: usize) -> MnemosConfig {
    MnemosConfig::builder()
        .message_window(message_window)
        .build()
}

/// App state over the given collaborators with a word tokenizer and a
/// small worker pool. Must be called from within a tokio runtime.
pub fn test_state(
    config: MnemosConfig,
    store: Arc<dyn MemoryStore>,
    completion: Arc<dyn CompletionService>,
    sink: Arc<dyn ReportSink>,
) -> Arc<AppState> {
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(WordTokenizer);
    let workers = WorkerPool::new(2, 16, sink);
    Arc::new(AppState::new(config, store, completion, tokenizer, workers))
}
