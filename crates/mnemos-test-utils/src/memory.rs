use async_trait::async_trait;
use mnemos_memory::search::rank_messages;
use mnemos_memory::{
    Memory, MemoryError, MemoryStore, Message, SearchPayload, SearchResult, Summary,
    select_messages,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct Session {
    messages: Vec<Message>,
    summary: Option<Summary>,
}

/// In-memory store that counts calls and records every summary written.
#[derive(Clone, Default)]
pub struct StubStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    written: Arc<Mutex<Vec<(String, Summary)>>>,
    get_calls: Arc<AtomicUsize>,
    missing_messages: bool,
}

impl StubStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that answers reads with `messages: None`.
    pub fn with_missing_messages() -> Self {
        Self {
            missing_messages: true,
            ..Self::default()
        }
    }

    pub fn seed(&self, session_id: &str, messages: Vec<Message>) {
        self.sessions
            .lock()
            .entry(session_id.to_string())
            .or_default()
            .messages
            .extend(messages);
    }

    pub fn seed_summary(&self, session_id: &str, summary: Summary) {
        self.sessions
            .lock()
            .entry(session_id.to_string())
            .or_default()
            .summary = Some(summary);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Summaries passed to `put_summary`, in order.
    pub fn written(&self) -> Vec<(String, Summary)> {
        self.written.lock().clone()
    }

    pub fn summary(&self, session_id: &str) -> Option<Summary> {
        self.sessions
            .lock()
            .get(session_id)
            .and_then(|session| session.summary.clone())
    }
}

#[async_trait]
impl MemoryStore for StubStore {
    async fn get_memory(&self, session_id: &str, last_n: usize) -> Result<Memory, MemoryError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let sessions = self.sessions.lock();
        let session = sessions
            .get(session_id)
            .ok_or_else(|| MemoryError::SessionNotFound(session_id.to_string()))?;
        let messages = if self.missing_messages {
            None
        } else {
            Some(select_messages(
                &session.messages,
                session.summary.as_ref(),
                last_n,
            ))
        };
        Ok(Memory {
            messages,
            summary: session.summary.clone(),
            metadata: Default::default(),
        })
    }

    async fn put_memory(&self, session_id: &str, messages: Vec<Message>) -> Result<(), MemoryError> {
        self.seed(session_id, messages);
        Ok(())
    }

    async fn get_summary(&self, session_id: &str) -> Result<Option<Summary>, MemoryError> {
        Ok(self.summary(session_id))
    }

    async fn put_summary(&self, session_id: &str, summary: Summary) -> Result<(), MemoryError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| MemoryError::SessionNotFound(session_id.to_string()))?;
        session.summary = Some(summary.clone());
        self.written.lock().push((session_id.to_string(), summary));
        Ok(())
    }

    async fn delete_memory(&self, session_id: &str) -> Result<(), MemoryError> {
        self.sessions
            .lock()
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| MemoryError::SessionNotFound(session_id.to_string()))
    }

    async fn search_memory(
        &self,
        session_id: &str,
        payload: &SearchPayload,
        limit: usize,
    ) -> Result<Vec<SearchResult>, MemoryError> {
        let sessions = self.sessions.lock();
        let session = sessions
            .get(session_id)
            .ok_or_else(|| MemoryError::SessionNotFound(session_id.to_string()))?;
        Ok(rank_messages(&session.messages, payload, limit))
    }
}
