//! End-of-utterance detection
//!
//! Splits a stream of 10ms frames into spoken turns. Frames are classified by RMS
//! energy; speech frames are buffered, and a run of silence after buffered speech
//! completes the utterance.

use super::capture::rms;

/// Minimum frame energy to count as speech
pub const ENERGY_THRESHOLD: f32 = 0.03;

/// Consecutive silent frames that end an utterance (more than this, 200ms)
pub const SILENCE_FRAMES: usize = 20;

/// Speech frames needed for an utterance to be worth transcribing
pub const MIN_SPEECH_FRAMES: usize = 5;

/// Result of feeding one frame
#[derive(Debug, Default, PartialEq)]
pub struct FrameOutcome {
    /// The frame was classified as speech
    pub speech: bool,
    /// A complete utterance, handed over whole
    pub utterance: Option<Vec<f32>>,
}

/// Accumulates speech frames into utterances
#[derive(Debug, Default)]
pub struct UtteranceSegmenter {
    buffer: Vec<f32>,
    speech_frames: usize,
    silence_frames: usize,
}

impl UtteranceSegmenter {
    /// Create an empty segmenter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a frame sounds like speech
    #[must_use]
    pub fn is_speech(frame: &[f32]) -> bool {
        rms(frame) > ENERGY_THRESHOLD
    }

    /// Feed one frame
    pub fn process(&mut self, frame: &[f32]) -> FrameOutcome {
        let speech = Self::is_speech(frame);

        if speech {
            self.buffer.extend_from_slice(frame);
            self.speech_frames += 1;
            self.silence_frames = 0;
            return FrameOutcome {
                speech,
                utterance: None,
            };
        }

        if self.buffer.is_empty() {
            return FrameOutcome::default();
        }

        self.silence_frames += 1;
        if self.silence_frames <= SILENCE_FRAMES {
            return FrameOutcome::default();
        }

        if self.speech_frames < MIN_SPEECH_FRAMES {
            tracing::trace!(frames = self.speech_frames, "speech burst too short, dropped");
            self.reset();
            return FrameOutcome::default();
        }

        let utterance = std::mem::take(&mut self.buffer);
        tracing::debug!(samples = utterance.len(), "utterance complete");
        self.reset();

        FrameOutcome {
            speech,
            utterance: Some(utterance),
        }
    }

    /// Buffered speech samples
    #[must_use]
    pub fn buffered(&self) -> &[f32] {
        &self.buffer
    }

    /// Consecutive silent frames since the last speech
    #[must_use]
    pub const fn silence_frames(&self) -> usize {
        self.silence_frames
    }

    /// Drop any buffered speech
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.speech_frames = 0;
        self.silence_frames = 0;
    }
}
