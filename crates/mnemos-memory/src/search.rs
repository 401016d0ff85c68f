//! Lexical search over session messages.
//!
//! Ranks messages by the share of query terms they contain. This is the
//! fallback used by stores that have no vector index.

use crate::model::{Message, SearchPayload, SearchResult};
use std::collections::BTreeSet;

/// Lowercased alphanumeric terms of `text`, deduplicated.
fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Distance of a message from the query terms: `1 - matched / total`.
fn distance(query: &BTreeSet<String>, message: &Message) -> f64 {
    let content = terms(&message.content);
    let matched = query.iter().filter(|term| content.contains(*term)).count();
    1.0 - matched as f64 / query.len() as f64
}

/// Rank `messages` against `payload`, closest first, newest first on ties.
///
/// Messages sharing no term with the query are dropped. A `limit` of 0
/// returns every hit.
pub fn rank_messages(messages: &[Message], payload: &SearchPayload, limit: usize) -> Vec<SearchResult> {
    let query = terms(&payload.text);
    if query.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<SearchResult> = messages
        .iter()
        .map(|message| (distance(&query, message), message))
        .filter(|(dist, _)| *dist < 1.0)
        .map(|(dist, message)| SearchResult {
            message: message.clone(),
            summary: None,
            meta: Default::default(),
            dist,
        })
        .collect();

    results.sort_by(|a, b| {
        a.dist
            .total_cmp(&b.dist)
            .then_with(|| b.message.created_at.cmp(&a.message.created_at))
    });
    if limit > 0 {
        results.truncate(limit);
    }
    results
}
