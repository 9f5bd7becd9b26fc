//! Speech-to-text (STT)

use async_trait::async_trait;

use super::capture::{SAMPLE_RATE, samples_to_wav};
use crate::{Error, Result};

/// Default Whisper transcription endpoint
pub const WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Turns recorded speech into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe WAV audio
    ///
    /// # Errors
    ///
    /// Returns error if transcription fails
    async fn transcribe(&self, wav: &[u8]) -> Result<String>;
}

/// Encode captured samples and transcribe them
///
/// # Errors
///
/// Returns error if encoding or transcription fails
pub async fn transcribe_samples(transcriber: &dyn Transcriber, samples: &[f32]) -> Result<String> {
    let wav = samples_to_wav(samples, SAMPLE_RATE)?;
    let text = transcriber.transcribe(&wav).await?;
    Ok(text.trim().to_string())
}

/// Response from the Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes speech with `OpenAI` Whisper
pub struct WhisperTranscriber {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl WhisperTranscriber {
    /// Create a Whisper transcriber
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            endpoint: WHISPER_URL.to_string(),
        })
    }

    /// Send requests to a different endpoint (self-hosted Whisper servers)
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, wav: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Whisper response");
            e
        })?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}
