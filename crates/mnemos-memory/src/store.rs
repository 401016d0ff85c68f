//! Memory store interface and the default file-backed implementation.

use crate::error::MemoryError;
use crate::model::{Memory, Message, SearchPayload, SearchResult, Summary};
use crate::search::rank_messages;
use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

const MESSAGES_FILE: &str = "messages.jsonl";
const SUMMARY_FILE: &str = "summary.json";

#[async_trait]
/// Durable per-session transcript and summary storage.
pub trait MemoryStore: Send + Sync {
    /// Read a session's memory.
    ///
    /// With `last_n == 0` the messages are exactly those not yet covered by
    /// the current summary. Otherwise the last `last_n` messages of the
    /// session are returned regardless of coverage.
    async fn get_memory(&self, session_id: &str, last_n: usize) -> Result<Memory, MemoryError>;

    /// Append messages to a session, creating it if needed.
    async fn put_memory(&self, session_id: &str, messages: Vec<Message>) -> Result<(), MemoryError>;

    /// Current summary of a session, if one was written.
    async fn get_summary(&self, session_id: &str) -> Result<Option<Summary>, MemoryError>;

    /// Replace the session's summary.
    async fn put_summary(&self, session_id: &str, summary: Summary) -> Result<(), MemoryError>;

    /// Remove a session's messages and summary.
    async fn delete_memory(&self, session_id: &str) -> Result<(), MemoryError>;

    /// Search a session's messages, closest first.
    async fn search_memory(
        &self,
        session_id: &str,
        payload: &SearchPayload,
        limit: usize,
    ) -> Result<Vec<SearchResult>, MemoryError>;
}

/// Messages after the summary point, oldest first.
///
/// When the summary point is not part of `messages` nothing can be treated as
/// covered and the full transcript is returned.
pub fn messages_since_summary_point(messages: &[Message], summary: Option<&Summary>) -> Vec<Message> {
    let Some(summary) = summary else {
        return messages.to_vec();
    };
    match messages
        .iter()
        .position(|message| message.uuid == summary.summary_point_uuid)
    {
        Some(index) => messages[index + 1..].to_vec(),
        None => {
            warn!(
                "summary point not found in transcript (summary_point_uuid={})",
                summary.summary_point_uuid
            );
            messages.to_vec()
        }
    }
}

/// Select the messages a `get_memory` call returns.
pub fn select_messages(messages: &[Message], summary: Option<&Summary>, last_n: usize) -> Vec<Message> {
    if last_n == 0 {
        return messages_since_summary_point(messages, summary);
    }
    let start = messages.len().saturating_sub(last_n);
    messages[start..].to_vec()
}

/// Reject session ids that cannot be used as a directory name.
pub fn validate_session_id(session_id: &str) -> Result<(), MemoryError> {
    let valid = !session_id.is_empty()
        && !session_id.starts_with('.')
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(MemoryError::InvalidSessionId(session_id.to_string()))
    }
}

/// File-backed store: one directory per session holding `messages.jsonl`
/// and `summary.json`.
#[derive(Debug)]
pub struct FileMemoryStore {
    root: PathBuf,
    /// Serializes writes so a summary replace never interleaves with an append.
    write_lock: Mutex<()>,
}

impl FileMemoryStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        info!("initialized file memory store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn session_dir(&self, session_id: &str) -> Result<PathBuf, MemoryError> {
        validate_session_id(session_id)?;
        Ok(self.root.join(session_id))
    }

    fn existing_session_dir(&self, session_id: &str) -> Result<PathBuf, MemoryError> {
        let dir = self.session_dir(session_id)?;
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(MemoryError::SessionNotFound(session_id.to_string()))
        }
    }

    fn load_messages(&self, dir: &Path) -> Result<Vec<Message>, MemoryError> {
        let path = dir.join(MESSAGES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(OpenOptions::new().read(true).open(path)?);
        let mut messages = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            messages.push(serde_json::from_str(&line)?);
        }
        Ok(messages)
    }

    fn load_summary(&self, dir: &Path) -> Result<Option<Summary>, MemoryError> {
        let path = dir.join(SUMMARY_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Replace the summary file via a temp file and rename.
    fn write_summary(&self, dir: &Path, summary: &Summary) -> Result<(), MemoryError> {
        let path = dir.join(SUMMARY_FILE);
        let temp_path = dir.join(format!("{SUMMARY_FILE}.tmp"));
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            file.write_all(serde_json::to_string(summary)?.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(temp_path, path)?;
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for FileMemoryStore {
    async fn get_memory(&self, session_id: &str, last_n: usize) -> Result<Memory, MemoryError> {
        let dir = self.existing_session_dir(session_id)?;
        let messages = self.load_messages(&dir)?;
        let summary = self.load_summary(&dir)?;
        let selected = select_messages(&messages, summary.as_ref(), last_n);
        debug!(
            "get memory (session_id={}, last_n={}, total={}, returned={})",
            session_id,
            last_n,
            messages.len(),
            selected.len()
        );
        Ok(Memory {
            messages: Some(selected),
            summary,
            metadata: Default::default(),
        })
    }

    async fn put_memory(&self, session_id: &str, messages: Vec<Message>) -> Result<(), MemoryError> {
        let dir = self.session_dir(session_id)?;
        let _guard = self.write_lock.lock();
        std::fs::create_dir_all(&dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(MESSAGES_FILE))?;
        for message in &messages {
            writeln!(file, "{}", serde_json::to_string(message)?)?;
        }
        debug!(
            "appended messages (session_id={}, count={})",
            session_id,
            messages.len()
        );
        Ok(())
    }

    async fn get_summary(&self, session_id: &str) -> Result<Option<Summary>, MemoryError> {
        let dir = self.existing_session_dir(session_id)?;
        self.load_summary(&dir)
    }

    async fn put_summary(&self, session_id: &str, summary: Summary) -> Result<(), MemoryError> {
        let dir = self.existing_session_dir(session_id)?;
        let _guard = self.write_lock.lock();
        self.write_summary(&dir, &summary)?;
        info!(
            "summary replaced (session_id={}, summary_point_uuid={}, token_count={})",
            session_id, summary.summary_point_uuid, summary.token_count
        );
        Ok(())
    }

    async fn delete_memory(&self, session_id: &str) -> Result<(), MemoryError> {
        let dir = self.existing_session_dir(session_id)?;
        let _guard = self.write_lock.lock();
        std::fs::remove_dir_all(&dir)?;
        info!("session memory deleted (session_id={})", session_id);
        Ok(())
    }

    async fn search_memory(
        &self,
        session_id: &str,
        payload: &SearchPayload,
        limit: usize,
    ) -> Result<Vec<SearchResult>, MemoryError> {
        let dir = self.existing_session_dir(session_id)?;
        let messages = self.load_messages(&dir)?;
        Ok(rank_messages(&messages, payload, limit))
    }
}
