//! Session memory model and storage for Mnemos.

pub mod error;
pub mod model;
pub mod search;
pub mod store;

/// Memory error type.
pub use error::MemoryError;
/// Transcript, summary, and search records.
pub use model::{Memory, Message, MessageEvent, Metadata, SearchPayload, SearchResult, Summary};
/// Store interface, file implementation, and shared selection helpers.
pub use store::{
    FileMemoryStore, MemoryStore, messages_since_summary_point, select_messages,
    validate_session_id,
};
