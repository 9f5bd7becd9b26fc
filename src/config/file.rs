//! TOML configuration file loading
//!
//! Supports `~/.config/neomind/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct NeomindConfigFile {
    /// Name sent with every chat message (e.g. "Sam")
    #[serde(default)]
    pub child_name: Option<String>,

    /// Chat service base URL
    #[serde(default)]
    pub server_url: Option<String>,

    /// Face style: "animated" or "still"
    #[serde(default)]
    pub face: Option<String>,

    /// Verbose logging
    #[serde(default)]
    pub debug: Option<bool>,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable speech output
    pub tts: Option<bool>,

    /// Enable microphone input
    pub microphone: Option<bool>,

    /// Phrases that wake the companion up
    pub wake_words: Option<Vec<String>>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the contents are not valid TOML for this schema
pub fn parse_config_file(content: &str) -> Result<NeomindConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from the standard path
///
/// Returns `NeomindConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> NeomindConfigFile {
    let Some(path) = config_file_path() else {
        return NeomindConfigFile::default();
    };

    if !path.exists() {
        return NeomindConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                NeomindConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            NeomindConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/neomind/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("neomind").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_file() {
        let file = parse_config_file(
            r#"
            child_name = "Sam"

            [voice]
            tts = false
            wake_words = ["hey neo"]
            "#,
        )
        .unwrap();

        assert_eq!(file.child_name.as_deref(), Some("Sam"));
        assert_eq!(file.voice.tts, Some(false));
        assert_eq!(file.voice.wake_words, Some(vec!["hey neo".to_string()]));
        assert!(file.voice.microphone.is_none());
        assert!(file.api_keys.openai.is_none());
    }

    #[test]
    fn test_parse_invalid_file() {
        assert!(parse_config_file("child_name = [").is_err());
    }
}
