//! Text-to-speech (TTS)

use async_trait::async_trait;

use super::playback::{AudioPlayback, PlaybackOutcome, StopSignal, decode_mp3};
use crate::{Error, Result};

/// Default `OpenAI` speech endpoint
pub const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Speaks replies aloud
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Speak `text`, resolving once playback has ended
    ///
    /// Returns `Interrupted` when `stop` was raised before or during playback.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn say(&self, text: &str, stop: StopSignal) -> Result<PlaybackOutcome>;
}

/// Synthesizes speech with the `OpenAI` TTS API and plays it locally
pub struct CloudSpeech {
    client: reqwest::Client,
    api_key: String,
    model: String,
    voice: String,
    speed: f32,
    endpoint: String,
}

impl CloudSpeech {
    /// Create a speech engine
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String, model: String, voice: String, speed: f32) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            voice,
            speed,
            endpoint: OPENAI_SPEECH_URL.to_string(),
        })
    }

    /// Send requests to a different endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechEngine for CloudSpeech {
    async fn say(&self, text: &str, stop: StopSignal) -> Result<PlaybackOutcome> {
        if stop.is_raised() {
            return Ok(PlaybackOutcome::Interrupted);
        }

        let mp3 = self.synthesize(text).await?;
        if stop.is_raised() {
            tracing::debug!("stopped before playback");
            return Ok(PlaybackOutcome::Interrupted);
        }

        let samples = decode_mp3(&mp3)?;

        tokio::task::spawn_blocking(move || {
            let playback = AudioPlayback::new()?;
            playback.play_blocking(samples, &stop)
        })
        .await
        .map_err(|e| Error::Tts(format!("playback task failed: {e}")))?
    }
}
