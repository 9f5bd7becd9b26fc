//! Voice processing module
//!
//! Handles audio capture, utterance segmentation, wake word matching,
//! transcription, speech synthesis, and playback.

mod capture;
mod mic;
mod playback;
mod segmenter;
mod stt;
mod tts;
mod wake_word;

pub use capture::{AudioCapture, FRAME_SAMPLES, SAMPLE_RATE, input_available, rms, samples_to_wav};
pub use mic::{FrameRouter, MicEvent, spawn_listener};
pub use playback::{
    AudioPlayback, PLAYBACK_SAMPLE_RATE, PlaybackOutcome, StopSignal, decode_mp3, output_available,
};
pub use segmenter::{
    ENERGY_THRESHOLD, FrameOutcome, MIN_SPEECH_FRAMES, SILENCE_FRAMES, UtteranceSegmenter,
};
pub use stt::{Transcriber, WHISPER_URL, WhisperTranscriber, transcribe_samples};
pub use tts::{CloudSpeech, OPENAI_SPEECH_URL, SpeechEngine};
pub use wake_word::WakeWords;
