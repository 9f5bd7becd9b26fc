//! Feature availability
//!
//! Voice features degrade independently: a missing microphone, audio output, or
//! API key disables only the feature that needs it.

use serde::Serialize;

use crate::config::Config;
use crate::voice;

/// Which optional features can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// A microphone is available and enabled
    pub microphone: bool,
    /// Speech can be transcribed
    pub transcription: bool,
    /// Replies can be spoken aloud
    pub speech: bool,
}

impl Capabilities {
    /// Everything available
    #[must_use]
    pub const fn all() -> Self {
        Self {
            microphone: true,
            transcription: true,
            speech: true,
        }
    }

    /// Text only
    #[must_use]
    pub const fn none() -> Self {
        Self {
            microphone: false,
            transcription: false,
            speech: false,
        }
    }

    /// Spoken input works end to end
    #[must_use]
    pub const fn voice_input(&self) -> bool {
        self.microphone && self.transcription
    }

    /// Probe audio devices and credentials against what the configuration allows
    #[must_use]
    pub fn detect(config: &Config) -> Self {
        let has_key = config
            .api_keys
            .openai
            .as_deref()
            .is_some_and(|k| !k.is_empty());

        Self::from_probes(config, has_key, voice::input_available(), voice::output_available())
    }

    /// Combine configuration with probe results
    #[must_use]
    pub fn from_probes(config: &Config, has_key: bool, has_input: bool, has_output: bool) -> Self {
        let microphone = config.voice.microphone_enabled && has_input;
        let transcription = microphone && has_key;
        let speech = config.voice.tts_enabled && has_key && has_output;

        if !config.voice.microphone_enabled {
            tracing::info!("voice input disabled by configuration");
        } else if !has_input {
            tracing::warn!("no microphone found, voice input disabled");
        } else if !has_key {
            tracing::warn!("OPENAI_API_KEY not set, voice input disabled");
        }

        if !config.voice.tts_enabled {
            tracing::info!("speech output disabled by configuration");
        } else if !has_key {
            tracing::warn!("OPENAI_API_KEY not set, replies will not be spoken");
        } else if !has_output {
            tracing::warn!("no audio output found, replies will not be spoken");
        }

        Self {
            microphone,
            transcription,
            speech,
        }
    }
}
