//! Dependencies shared by every extractor.

use crate::context::ExtractContext;
use crate::pool::WorkerPool;
use mnemos_config::MnemosConfig;
use mnemos_llm::{CompletionService, Tokenizer};
use mnemos_memory::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

/// Explicitly injected dependency bundle passed to extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MnemosConfig>,
    pub store: Arc<dyn MemoryStore>,
    pub completion: Arc<dyn CompletionService>,
    pub tokenizer: Arc<dyn Tokenizer>,
    pub workers: WorkerPool,
}

impl AppState {
    pub fn new(
        config: MnemosConfig,
        store: Arc<dyn MemoryStore>,
        completion: Arc<dyn CompletionService>,
        tokenizer: Arc<dyn Tokenizer>,
        workers: WorkerPool,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            completion,
            tokenizer,
            workers,
        }
    }

    /// Fresh context carrying the configured per-run timeout, if any.
    pub fn extract_context(&self) -> ExtractContext {
        match self.config.extractors.timeout_secs {
            Some(secs) => ExtractContext::new().with_timeout(Duration::from_secs(secs)),
            None => ExtractContext::new(),
        }
    }
}
