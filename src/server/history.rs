//! Per-child conversation history

use std::collections::HashMap;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Entries scanned by a memory search, counted back from the newest
pub const SEARCH_WINDOW: usize = 5;

/// Relevance reported for every memory hit
pub const MEMORY_RELEVANCE: f64 = 0.8;

/// Who said a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    User,
    Neo,
}

/// One remembered message
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// A search hit
#[derive(Debug, Clone, Serialize)]
pub struct Memory {
    pub fact: String,
    pub timestamp: DateTime<Local>,
    pub relevance: f64,
}

/// Conversation history for every child, kept for the life of the process
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: HashMap<String, Vec<HistoryEntry>>,
}

impl ConversationStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message and return the child's entry count
    pub fn record(&mut self, child_name: &str, kind: EntryKind, message: &str) -> usize {
        let entries = self.conversations.entry(child_name.to_string()).or_default();
        entries.push(HistoryEntry {
            timestamp: Local::now(),
            message: message.to_string(),
            kind,
        });
        entries.len()
    }

    /// Entries recorded for a child
    #[must_use]
    pub fn history(&self, child_name: &str) -> &[HistoryEntry] {
        self.conversations
            .get(child_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Recent entries containing `query`, case-insensitively
    #[must_use]
    pub fn search(&self, child_name: &str, query: &str) -> Vec<Memory> {
        let query = query.to_lowercase();
        let history = self.history(child_name);
        let recent = &history[history.len().saturating_sub(SEARCH_WINDOW)..];

        recent
            .iter()
            .filter(|entry| entry.message.to_lowercase().contains(&query))
            .map(|entry| Memory {
                fact: entry.message.clone(),
                timestamp: entry.timestamp,
                relevance: MEMORY_RELEVANCE,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_per_child() {
        let mut store = ConversationStore::new();
        assert_eq!(store.record("mia", EntryKind::User, "hi"), 1);
        assert_eq!(store.record("mia", EntryKind::Neo, "hello"), 2);
        assert_eq!(store.record("leo", EntryKind::User, "hey"), 1);
        assert_eq!(store.history("mia").len(), 2);
        assert!(store.history("nobody").is_empty());
    }

    #[test]
    fn test_search_only_recent_entries() {
        let mut store = ConversationStore::new();
        store.record("mia", EntryKind::User, "I love Dinosaurs");
        for i in 0..SEARCH_WINDOW {
            store.record("mia", EntryKind::Neo, &format!("reply {i}"));
        }
        assert!(store.search("mia", "dinosaurs").is_empty());

        store.record("mia", EntryKind::User, "more DINOSAURS please");
        let hits = store.search("mia", "dinosaurs");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].fact, "more DINOSAURS please");
        assert!((hits[0].relevance - MEMORY_RELEVANCE).abs() < f64::EPSILON);
    }
}
