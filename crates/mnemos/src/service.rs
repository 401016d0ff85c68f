//! Service facade wiring the store, completion backend, and extractors.

use crate::error::MnemosError;
use log::{debug, info, warn};
use mnemos_config::MnemosConfig;
use mnemos_extractors::{
    AppState, Extractor, ExtractorRegistry, LogReportSink, ReportSink, SummaryExtractor,
    WorkerPool,
};
use mnemos_llm::{CompletionService, EstimatingTokenizer, OpenAiCompletionService, Tokenizer};
use mnemos_memory::{
    FileMemoryStore, Memory, MemoryStore, Message, MessageEvent, SearchPayload, SearchResult,
};
use std::sync::Arc;
use std::time::Duration;

/// Transcript writer and extractor dispatcher for a set of sessions.
pub struct Mnemos {
    state: Arc<AppState>,
    registry: ExtractorRegistry,
    summarizer: Arc<SummaryExtractor>,
}

impl Mnemos {
    /// Wire the default collaborators from `config`: a file store, the
    /// OpenAI-compatible completion client, and the estimating tokenizer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: MnemosConfig) -> Result<Self, MnemosError> {
        Self::from_config_with_sink(config, Arc::new(LogReportSink))
    }

    pub fn from_config_with_sink(
        config: MnemosConfig,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self, MnemosError> {
        Self::from_config_with_tokenizer(config, Arc::new(EstimatingTokenizer), sink)
    }

    /// Like [`Mnemos::from_config_with_sink`], counting tokens with
    /// `tokenizer` instead of the byte-based estimate.
    pub fn from_config_with_tokenizer(
        config: MnemosConfig,
        tokenizer: Arc<dyn Tokenizer>,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self, MnemosError> {
        let store_path = config.store_path().ok_or(MnemosError::MissingStorePath)?;
        let store: Arc<dyn MemoryStore> = Arc::new(FileMemoryStore::new(&store_path)?);

        let llm = &config.llm;
        let mut completion =
            OpenAiCompletionService::new(&llm.model, Duration::from_secs(llm.timeout_secs))?
                .with_base_url(&llm.base_url);
        match std::env::var(&llm.api_key_env) {
            Ok(api_key) if !api_key.is_empty() => completion = completion.with_api_key(api_key),
            _ => warn!(
                "completion api key not set (env={}); requests are sent unauthenticated",
                llm.api_key_env
            ),
        }

        Self::with_collaborators(config, store, Arc::new(completion), tokenizer, sink)
    }

    /// Wire explicit collaborators. Must be called from within a tokio runtime.
    pub fn with_collaborators(
        config: MnemosConfig,
        store: Arc<dyn MemoryStore>,
        completion: Arc<dyn CompletionService>,
        tokenizer: Arc<dyn Tokenizer>,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self, MnemosError> {
        let workers = WorkerPool::new(
            config.extractors.workers.max_concurrent,
            config.extractors.workers.queue_capacity,
            sink,
        );
        let summarizer = Arc::new(SummaryExtractor::from_config(
            &config.extractors.summarizer,
        )?);
        let mut registry = ExtractorRegistry::new();
        if config.extractors.summarizer.enabled {
            registry.register(summarizer.clone());
        }
        info!(
            "mnemos ready (model={}, message_window={}, extractors={})",
            config.llm.model,
            config.memory.message_window,
            registry.len()
        );
        let state = Arc::new(AppState::new(config, store, completion, tokenizer, workers));
        Ok(Self {
            state,
            registry,
            summarizer,
        })
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Append messages to a session and notify the registered extractors.
    ///
    /// Messages without a token count get one from the tokenizer. Extraction
    /// runs in the background and never fails the append: once the messages
    /// are stored, a refused notification (full queue, pool shut down) is
    /// logged and the session is compacted on a later append.
    pub async fn append(&self, session_id: &str, messages: Vec<Message>) -> Result<(), MnemosError> {
        let mut counted = Vec::with_capacity(messages.len());
        for message in messages {
            if message.token_count == 0 {
                let tokens = self.state.tokenizer.count(&message.content)?;
                counted.push(message.with_token_count(tokens));
            } else {
                counted.push(message);
            }
        }
        debug!(
            "appending messages (session_id={}, count={})",
            session_id,
            counted.len()
        );
        self.state.store.put_memory(session_id, counted.clone()).await?;

        let event = MessageEvent::new(session_id, counted);
        let ctx = self.state.extract_context();
        if let Err(err) = self.registry.notify_all(&ctx, &self.state, Some(&event)) {
            warn!(
                "extraction skipped for appended messages (session_id={}, error={})",
                session_id, err
            );
        }
        Ok(())
    }

    pub async fn memory(&self, session_id: &str, last_n: usize) -> Result<Memory, MnemosError> {
        Ok(self.state.store.get_memory(session_id, last_n).await?)
    }

    /// Run the summarizer for a session and wait for it to finish.
    pub async fn summarize(&self, session_id: &str) -> Result<(), MnemosError> {
        let ctx = self.state.extract_context();
        let event = MessageEvent::new(session_id, Vec::new());
        self.summarizer.extract(&ctx, &self.state, &event).await?;
        Ok(())
    }

    pub async fn search(
        &self,
        session_id: &str,
        text: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, MnemosError> {
        let payload = SearchPayload {
            text: text.to_string(),
            ..SearchPayload::default()
        };
        Ok(self
            .state
            .store
            .search_memory(session_id, &payload, limit)
            .await?)
    }

    pub async fn delete(&self, session_id: &str) -> Result<(), MnemosError> {
        Ok(self.state.store.delete_memory(session_id).await?)
    }

    /// Stop accepting work and wait for background extraction to finish.
    pub async fn shutdown(&self) {
        self.state.workers.shutdown().await;
    }
}
