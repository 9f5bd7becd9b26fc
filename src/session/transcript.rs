//! Conversation transcript
//!
//! Append-only and in memory for the lifetime of the process.

use chrono::{DateTime, Local};
use serde::Serialize;

/// Display name of the companion
pub const AGENT_NAME: &str = "Neo";

/// Who said something
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Agent,
}

/// One line of conversation
#[derive(Debug, Clone, Serialize)]
pub struct Utterance {
    pub speaker: Speaker,
    /// Name shown next to the text
    pub name: String,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl Utterance {
    /// Chat-window rendering, e.g. `[14:05] Neo: Hello!`
    #[must_use]
    pub fn display_line(&self) -> String {
        format!("[{}] {}: {}", self.timestamp.format("%H:%M"), self.name, self.text)
    }
}

/// Ordered list of utterances
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Utterance>,
}

impl Transcript {
    /// Create an empty transcript
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line from the child
    pub fn push_user(&mut self, name: &str, text: &str) {
        self.push(Speaker::User, name, text);
    }

    /// Append a line from Neo
    pub fn push_agent(&mut self, text: &str) {
        self.push(Speaker::Agent, AGENT_NAME, text);
    }

    fn push(&mut self, speaker: Speaker, name: &str, text: &str) {
        tracing::debug!(?speaker, name, text, "utterance appended");
        self.entries.push(Utterance {
            speaker,
            name: name.to_string(),
            text: text.to_string(),
            timestamp: Local::now(),
        });
    }

    /// All utterances, oldest first
    #[must_use]
    pub fn entries(&self) -> &[Utterance] {
        &self.entries
    }

    /// Utterances appended after the first `seen`
    #[must_use]
    pub fn since(&self, seen: usize) -> &[Utterance] {
        self.entries.get(seen..).unwrap_or_default()
    }

    /// Most recent utterance
    #[must_use]
    pub fn last(&self) -> Option<&Utterance> {
        self.entries.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
