//! Configuration management for NeoMind
//!
//! Every setting is read once at startup with precedence env > TOML file > default.

pub mod file;

use crate::face::FaceStyle;
use crate::{Error, Result};

use file::NeomindConfigFile;

/// Default chat service URL
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Default name used when the child hasn't told us theirs
pub const DEFAULT_CHILD_NAME: &str = "friend";

/// Default wake words
pub const DEFAULT_WAKE_WORDS: [&str; 3] = ["hey", "hi", "hello"];

/// NeoMind configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Name sent to the chat service with every message
    pub child_name: String,

    /// Chat service base URL
    pub server_url: String,

    /// Face feature richness
    pub face: FaceStyle,

    /// Verbose logging (also enables the heartbeat log)
    pub debug: bool,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Speak replies aloud
    pub tts_enabled: bool,

    /// Listen on the microphone
    pub microphone_enabled: bool,

    /// Phrases that move the companion from idle to listening
    pub wake_words: Vec<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (for Whisper and TTS)
    pub openai: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            child_name: DEFAULT_CHILD_NAME.to_string(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            face: FaceStyle::default(),
            debug: false,
            voice: VoiceConfig::default(),
            api_keys: ApiKeys::default(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            tts_enabled: true,
            microphone_enabled: true,
            wake_words: DEFAULT_WAKE_WORDS.iter().map(ToString::to_string).collect(),
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
        }
    }
}

impl Config {
    /// Load configuration from the process environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a setting has an invalid value
    pub fn load() -> Result<Self> {
        Self::resolve(|key| std::env::var(key).ok(), file::load_config_file())
    }

    /// Resolve configuration from an env lookup and a parsed config file
    ///
    /// # Errors
    ///
    /// Returns error if a setting has an invalid value
    pub fn resolve<F>(env: F, fc: NeomindConfigFile) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Unreadable toggles fall through to the file and then the default
        let flag = |key: &str| -> Option<bool> {
            let value = env(key)?;
            let parsed = parse_flag(&value);
            if parsed.is_none() {
                tracing::warn!(key, value = %value, "ignoring toggle that is not a boolean");
            }
            parsed
        };

        let face = match env("NEOMIND_FACE").or(fc.face) {
            Some(s) => s.parse()?,
            None => defaults.face,
        };

        let wake_words = env("NEOMIND_WAKE_WORDS")
            .map(|s| s.split(',').map(ToString::to_string).collect())
            .or(fc.voice.wake_words)
            .map(normalize_wake_words)
            .unwrap_or(defaults.voice.wake_words);

        if wake_words.is_empty() {
            return Err(Error::Config("at least one wake word is required".to_string()));
        }

        // NEOMIND_NO_* flags are negative, the file keys are positive
        let tts_enabled = flag("NEOMIND_NO_TTS")
            .map(|off| !off)
            .or(fc.voice.tts)
            .unwrap_or(defaults.voice.tts_enabled);
        let microphone_enabled = flag("NEOMIND_NO_MIC")
            .map(|off| !off)
            .or(fc.voice.microphone)
            .unwrap_or(defaults.voice.microphone_enabled);

        let voice = VoiceConfig {
            tts_enabled,
            microphone_enabled,
            wake_words,
            stt_model: env("NEOMIND_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(defaults.voice.stt_model),
            tts_model: env("NEOMIND_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or(defaults.voice.tts_model),
            tts_voice: env("NEOMIND_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or(defaults.voice.tts_voice),
            tts_speed: fc.voice.tts_speed.unwrap_or(defaults.voice.tts_speed),
        };

        let child_name = env("NEOMIND_CHILD_NAME")
            .or(fc.child_name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.child_name);

        let server_url = env("NEOMIND_SERVER_URL")
            .or(fc.server_url)
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.server_url);

        Ok(Self {
            child_name,
            server_url,
            face,
            debug: flag("NEOMIND_DEBUG").or(fc.debug).unwrap_or(defaults.debug),
            voice,
            api_keys: ApiKeys {
                openai: env("OPENAI_API_KEY")
                    .or(fc.api_keys.openai)
                    .filter(|k| !k.is_empty()),
            },
        })
    }
}

/// Parse an environment-style boolean toggle
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn normalize_wake_words(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}
