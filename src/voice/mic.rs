//! Microphone listener thread
//!
//! Owns the capture stream and routes frames based on the published session state:
//! while Neo speaks, the first speech frame reports a barge-in; while idle or
//! listening, frames are segmented into utterances for transcription.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::capture::AudioCapture;
use super::segmenter::UtteranceSegmenter;
use crate::session::{ConversationState, SessionSnapshot};

/// How often the listener drains captured audio
const POLL_INTERVAL: Duration = Duration::from_millis(30);

/// Events sent from the listener thread to the UI loop
#[derive(Debug, Clone, PartialEq)]
pub enum MicEvent {
    /// Someone started talking over Neo
    SpeechDetected,
    /// A complete spoken turn, ready for transcription
    Utterance(Vec<f32>),
    /// The microphone could not be opened or failed
    Unavailable(String),
}

/// Decides what each captured frame means in the current state
#[derive(Debug, Default)]
pub struct FrameRouter {
    segmenter: UtteranceSegmenter,
    barge_in_sent: bool,
}

impl FrameRouter {
    /// Create a router with an empty segmenter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one frame captured while the session was in `state`
    pub fn route(&mut self, state: ConversationState, frame: &[f32]) -> Option<MicEvent> {
        match state {
            ConversationState::Speaking => {
                self.segmenter.reset();
                if !self.barge_in_sent && UtteranceSegmenter::is_speech(frame) {
                    self.barge_in_sent = true;
                    return Some(MicEvent::SpeechDetected);
                }
                None
            }
            ConversationState::Idle | ConversationState::Listening => {
                self.barge_in_sent = false;
                self.segmenter.process(frame).utterance.map(MicEvent::Utterance)
            }
            ConversationState::Thinking => {
                self.barge_in_sent = false;
                self.segmenter.reset();
                None
            }
        }
    }
}

/// Start the listener on its own thread
///
/// The thread exits when `shutdown` is raised, the event receiver is dropped,
/// or the microphone fails.
///
/// # Errors
///
/// Returns error if the thread cannot be spawned
pub fn spawn_listener<T>(
    session: watch::Receiver<SessionSnapshot>,
    events: mpsc::UnboundedSender<T>,
    shutdown: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>>
where
    T: From<MicEvent> + Send + 'static,
{
    std::thread::Builder::new()
        .name("neomind-mic".to_string())
        .spawn(move || run_listener(&session, &events, &shutdown))
}

fn run_listener<T: From<MicEvent>>(
    session: &watch::Receiver<SessionSnapshot>,
    events: &mpsc::UnboundedSender<T>,
    shutdown: &AtomicBool,
) {
    let mut capture = match AudioCapture::new().and_then(|mut c| c.start().map(|()| c)) {
        Ok(capture) => capture,
        Err(e) => {
            tracing::warn!(error = %e, "microphone unavailable");
            let _ = events.send(MicEvent::Unavailable(e.to_string()).into());
            return;
        }
    };

    tracing::info!("microphone listener started");
    let mut router = FrameRouter::new();

    while !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(POLL_INTERVAL);

        for frame in capture.take_frames() {
            let state = session.borrow().state;
            if let Some(event) = router.route(state, &frame)
                && events.send(event.into()).is_err()
            {
                capture.stop();
                return;
            }
        }
    }

    capture.stop();
    tracing::info!("microphone listener stopped");
}
