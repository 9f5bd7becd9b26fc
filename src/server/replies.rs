//! Keyword-matched replies

/// Reply topics, checked in order; the first topic with a matching word wins
const TOPICS: &[(&[&str], &str)] = &[
    (
        &["hello", "hi", "hey"],
        "Hello {name}! How are you doing today? What would you like to learn about?",
    ),
    (
        &["what", "how", "why", "when", "where"],
        "That's a great question, {name}! Let me think about that. What specifically interests you about this topic?",
    ),
    (
        &["math", "numbers", "calculate"],
        "I love math, {name}! Math is like solving fun puzzles. What math problem are you working on?",
    ),
    (
        &["science", "experiment", "discovery"],
        "Science is amazing, {name}! There's so much to discover. What scientific concept fascinates you?",
    ),
    (
        &["art", "draw", "create", "paint"],
        "Art is wonderful for expressing creativity, {name}! What kind of art project are you thinking about?",
    ),
    (
        &["story", "book", "read"],
        "I love stories too, {name}! Stories help us learn about the world. What's your favorite type of story?",
    ),
    (
        &["game", "play", "fun"],
        "Playing and learning go great together, {name}! What kind of games do you enjoy?",
    ),
];

const FALLBACK: &str =
    "That's interesting, {name}! Tell me more about what you're thinking. I'm here to learn and explore with you!";

/// Pick a reply for `message`, addressed to `child_name`
///
/// Keywords match whole words, case-insensitively.
#[must_use]
pub fn reply_for(message: &str, child_name: &str) -> String {
    let lowered = message.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect();

    let template = TOPICS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| words.contains(k)))
        .map_or(FALLBACK, |&(_, template)| template);

    template.replace("{name}", child_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting() {
        assert_eq!(
            reply_for("Hi there", "Mia"),
            "Hello Mia! How are you doing today? What would you like to learn about?"
        );
    }

    #[test]
    fn test_topic_order() {
        // Questions win over later topics
        assert!(reply_for("what is math?", "Sam").starts_with("That's a great question, Sam!"));
        assert!(reply_for("I like math", "Sam").starts_with("I love math, Sam!"));
        assert!(reply_for("let's PLAY", "Sam").starts_with("Playing and learning"));
    }

    #[test]
    fn test_whole_words_only() {
        // "this" contains "hi" and "heart" contains "art"
        assert!(reply_for("this is my heart", "Leo").starts_with("That's interesting, Leo!"));
    }

    #[test]
    fn test_fallback() {
        assert_eq!(
            reply_for("", "friend"),
            "That's interesting, friend! Tell me more about what you're thinking. I'm here to learn and explore with you!"
        );
    }
}
