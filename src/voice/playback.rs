//! Audio playback to speakers

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

/// Sample rate for playback (matches TTS output)
pub const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// How often a running playback checks for completion or interruption
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every sample was played
    Finished,
    /// Stopped early by the caller
    Interrupted,
}

/// Stop request for one utterance
///
/// Clones share the flag. A fresh signal is made for every utterance, so a stop raised
/// before playback begins still applies to it.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Create a signal that has not been raised
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask playback to stop
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a stop was requested
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Check whether the default host has an output device
#[must_use]
pub fn output_available() -> bool {
    cpal::default_host().default_output_device().is_some()
}

/// Plays mono audio to the default output device
pub struct AudioPlayback {
    config: StreamConfig,
}

impl AudioPlayback {
    /// Open the default output device at 24kHz
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let rate = SampleRate(PLAYBACK_SAMPLE_RATE);
        let supports_rate = |c: &cpal::SupportedStreamConfigRange, channels: u16| {
            c.channels() == channels && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
        };

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| supports_rate(c, 1))
            .or_else(|| {
                device
                    .supported_output_configs()
                    .ok()?
                    .find(|c| supports_rate(c, 2))
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config.with_sample_rate(rate).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self { config })
    }

    /// Play samples, blocking until they finish or `stop` is raised
    ///
    /// # Errors
    ///
    /// Returns error if the output stream cannot be built or started
    pub fn play_blocking(&self, samples: Vec<f32>, stop: &StopSignal) -> Result<PlaybackOutcome> {
        if stop.is_raised() {
            return Ok(PlaybackOutcome::Interrupted);
        }
        if samples.is_empty() {
            return Ok(PlaybackOutcome::Finished);
        }

        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::Audio("output device disappeared".to_string()))?;

        let channels = usize::from(self.config.channels);
        let sample_count = samples.len();
        let samples = Arc::new(samples);
        let position = Arc::new(AtomicUsize::new(0));

        let stream = {
            let samples = Arc::clone(&samples);
            let position = Arc::clone(&position);
            device
                .build_output_stream(
                    &self.config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        let mut pos = position.load(Ordering::Relaxed);
                        for frame in data.chunks_mut(channels) {
                            let sample = samples.get(pos).copied().unwrap_or(0.0);
                            frame.fill(sample);
                            if pos < samples.len() {
                                pos += 1;
                            }
                        }
                        position.store(pos, Ordering::Relaxed);
                    },
                    |err| {
                        tracing::error!(error = %err, "audio playback error");
                    },
                    None,
                )
                .map_err(|e| Error::Audio(e.to_string()))?
        };

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        let duration_ms = (sample_count as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
        let deadline = Instant::now() + Duration::from_millis(duration_ms + 500);

        let outcome = loop {
            if stop.is_raised() {
                break PlaybackOutcome::Interrupted;
            }
            if position.load(Ordering::Relaxed) >= sample_count || Instant::now() > deadline {
                break PlaybackOutcome::Finished;
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        drop(stream);
        tracing::debug!(samples = sample_count, ?outcome, "playback ended");

        Ok(outcome)
    }
}

/// Decode MP3 bytes to mono f32 samples
///
/// # Errors
///
/// Returns error if the data is not valid MP3
pub fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) if frame.channels == 2 => {
                samples.extend(frame.data.chunks(2).map(|chunk| {
                    let left = f32::from(chunk[0]) / 32768.0;
                    let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                    f32::midpoint(left, right)
                }));
            }
            Ok(frame) => {
                samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}
