//! Reply-sentiment heuristic
//!
//! Picks the face to show alongside a reply. Positive words win over uncertain ones.

use crate::face::EmotionState;

/// Words that make Neo excited
const POSITIVE: [&str; 3] = ["great", "awesome", "amazing"];

/// Words that make Neo look confused
const UNCERTAIN: [&str; 3] = ["confused", "sorry", "not sure"];

/// Emotion to show for a reply, case-insensitive
#[must_use]
pub fn emotion_for_reply(text: &str) -> EmotionState {
    let lowered = text.to_lowercase();

    if POSITIVE.iter().any(|w| lowered.contains(w)) {
        EmotionState::Excited
    } else if UNCERTAIN.iter().any(|w| lowered.contains(w)) {
        EmotionState::Confused
    } else {
        EmotionState::Happy
    }
}
