//! Wake word matching
//!
//! Wake words are checked on transcribed text: a transcript wakes the companion when
//! it starts with one of the configured phrases as whole words.

/// Configured wake phrases
#[derive(Debug, Clone)]
pub struct WakeWords {
    words: Vec<String>,
}

impl WakeWords {
    /// Create a matcher; phrases are lowercased and trimmed, blanks dropped
    #[must_use]
    pub fn new(words: Vec<String>) -> Self {
        let normalized: Vec<String> = words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        tracing::debug!(wake_words = ?normalized, "wake words configured");

        Self { words: normalized }
    }

    /// The wake phrase a transcript starts with, if any
    #[must_use]
    pub fn matches(&self, transcript: &str) -> Option<&str> {
        let normalized = transcript
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();

        self.words
            .iter()
            .find(|word| {
                normalized.strip_prefix(word.as_str()).is_some_and(|rest| {
                    rest.chars().next().is_none_or(|c| !c.is_alphanumeric())
                })
            })
            .map(String::as_str)
    }

    /// The configured phrases
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wake_words() -> WakeWords {
        WakeWords::new(vec!["hey".into(), "hi".into(), "hello".into()])
    }

    #[test]
    fn test_matches_leading_phrase() {
        let ww = wake_words();
        assert_eq!(ww.matches("Hey Neo, what's up?"), Some("hey"));
        assert_eq!(ww.matches("  hello."), Some("hello"));
        assert_eq!(ww.matches("HI"), Some("hi"));
    }

    #[test]
    fn test_requires_word_boundary() {
        let ww = wake_words();
        assert_eq!(ww.matches("history is fun"), None);
        assert_eq!(ww.matches("heyyy"), None);
    }

    #[test]
    fn test_must_start_transcript() {
        assert_eq!(wake_words().matches("well hello there"), None);
    }

    #[test]
    fn test_normalization() {
        let ww = WakeWords::new(vec!["  Hey NEO  ".into(), "   ".into()]);
        assert_eq!(ww.words(), &["hey neo"]);
        assert_eq!(ww.matches("hey neo!"), Some("hey neo"));
        assert_eq!(ww.matches("hey there"), None);
    }
}
