//! Conversation turn state machine
//!
//! [`SessionController`] owns the conversation state, the face and the timer scheduler.
//! Every public operation applies a whole transition (state, emotion, transcript,
//! animation) and then commits once: the face frame is drawn and a
//! [`SessionSnapshot`] is published. Slow work is never done here; operations return
//! [`Effect`]s for the UI loop to run on background tasks, and results come back tagged
//! with the turn they belong to so stale ones can be dropped.

pub mod sentiment;
pub mod transcript;

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, watch};

use crate::canvas::Canvas;
use crate::capabilities::Capabilities;
use crate::config::Config;
use crate::face::{EmotionState, FaceFrame, FaceRenderer};
use crate::scheduler::{Scheduler, TimerHandle, TimerKind};
use crate::voice::WakeWords;

pub use sentiment::emotion_for_reply;
pub use transcript::{AGENT_NAME, Speaker, Transcript, Utterance};

/// How long to wait for an utterance after the wake word
pub const LISTEN_TIMEOUT: Duration = Duration::from_secs(8);

/// Shown when speech could not be turned into text
pub const NOT_HEARD_REPLY: &str = "Sorry, I didn't catch that. Can you say it again?";

/// Interval between heartbeat log lines
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Conversation turn state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Idle,
    Listening,
    Thinking,
    Speaking,
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "Ready",
            Self::Listening => "Listening...",
            Self::Thinking => "Thinking...",
            Self::Speaking => "Speaking...",
        })
    }
}

/// Work the UI loop must start after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the chat service for a reply
    LookupReply {
        turn: u64,
        message: String,
        child_name: String,
    },
    /// Speak a reply; report back with the same turn when playback ends
    Speak { turn: u64, text: String },
    /// Halt the speech engine mid-utterance
    StopPlayback,
}

/// Consistent view of the session published after every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionSnapshot {
    pub state: ConversationState,
    pub emotion: EmotionState,
    pub mouth_animating: bool,
    pub turn: u64,
}

/// Session settings taken from configuration
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Name sent with chat messages and shown in the transcript
    pub child_name: String,
    /// Phrases that start listening
    pub wake_words: Vec<String>,
    /// Log the state every few seconds
    pub heartbeat: bool,
}

impl SessionOptions {
    /// Take session settings from the loaded configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            child_name: config.child_name.clone(),
            wake_words: config.voice.wake_words.clone(),
            heartbeat: config.debug,
        }
    }
}

/// Drives the conversation and the face
pub struct SessionController {
    state: ConversationState,
    face: FaceRenderer,
    sched: Scheduler,
    canvas: Canvas,
    transcript: Transcript,
    caps: Capabilities,
    wake_words: WakeWords,
    child_name: String,
    turn: u64,
    interrupted: bool,
    listen_timer: Option<TimerHandle>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    /// Start a session: happy face, blinking, welcome line
    #[must_use]
    pub fn new(options: SessionOptions, caps: Capabilities, face: FaceRenderer) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());

        let mut controller = Self {
            state: ConversationState::Idle,
            face,
            sched: Scheduler::new(),
            canvas: Canvas::new(),
            transcript: Transcript::new(),
            caps,
            wake_words: WakeWords::new(options.wake_words),
            child_name: options.child_name,
            turn: 0,
            interrupted: false,
            listen_timer: None,
            snapshot_tx,
        };

        controller.face.start(&mut controller.sched);
        if options.heartbeat {
            controller.sched.schedule(HEARTBEAT_INTERVAL, TimerKind::Heartbeat);
        }

        let welcome = format!("Hello {}! I'm {AGENT_NAME}. Let's chat!", controller.child_name);
        controller.transcript.push_agent(&welcome);

        tracing::info!(capabilities = ?caps, child = %controller.child_name, "session started");
        controller.commit();
        controller
    }

    /// Current conversation state
    #[must_use]
    pub const fn state(&self) -> ConversationState {
        self.state
    }

    /// The face
    #[must_use]
    pub const fn face(&self) -> &FaceRenderer {
        &self.face
    }

    /// The canvas the face is drawn on
    #[must_use]
    pub const fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Conversation so far
    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// What this session can do
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Current turn number
    #[must_use]
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    /// Whether the last spoken reply was cut off by the child
    #[must_use]
    pub const fn was_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Name sent with chat messages
    #[must_use]
    pub fn child_name(&self) -> &str {
        &self.child_name
    }

    /// Pending timers
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.sched
    }

    /// Latest published snapshot
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        *self.snapshot_tx.borrow()
    }

    /// Subscribe to session snapshots
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to face frames
    #[must_use]
    pub fn subscribe_frames(&self) -> broadcast::Receiver<FaceFrame> {
        self.canvas.subscribe()
    }

    /// Change the name used for the child
    pub fn set_child_name(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        tracing::info!(name, "child name changed");
        self.child_name = name.to_string();
    }

    /// A typed message was submitted
    pub fn submit_text(&mut self, text: &str) -> Vec<Effect> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let effects = match self.state {
            ConversationState::Idle | ConversationState::Listening => self.begin_thinking(text),
            ConversationState::Thinking | ConversationState::Speaking => {
                tracing::warn!(state = ?self.state, "busy, message ignored");
                Vec::new()
            }
        };

        self.commit();
        effects
    }

    /// Transcribed speech arrived from the microphone
    pub fn on_transcript(&mut self, text: &str) -> Vec<Effect> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let effects = match self.state {
            ConversationState::Idle => {
                if let Some(word) = self.wake_words.matches(text) {
                    tracing::info!(wake_word = word, transcript = text, "wake word detected");
                    self.begin_listening();
                } else {
                    tracing::debug!(transcript = text, "no wake word, ignored");
                }
                Vec::new()
            }
            ConversationState::Listening => self.begin_thinking(text),
            ConversationState::Thinking | ConversationState::Speaking => {
                tracing::debug!(state = ?self.state, transcript = text, "transcript ignored");
                Vec::new()
            }
        };

        self.commit();
        effects
    }

    /// A reply came back for `turn`
    ///
    /// Replies for any turn other than the one currently thinking are stale and dropped.
    pub fn on_reply(&mut self, turn: u64, text: &str) -> Vec<Effect> {
        if self.state != ConversationState::Thinking || turn != self.turn {
            tracing::debug!(turn, current = self.turn, state = ?self.state, "discarding stale reply");
            return Vec::new();
        }

        self.transcript.push_agent(text);
        self.face.set_emotion(emotion_for_reply(text), &mut self.sched);

        let effects = if self.caps.speech {
            self.set_state(ConversationState::Speaking);
            self.interrupted = false;
            self.face.start_mouth_animation(&mut self.sched);
            vec![Effect::Speak {
                turn,
                text: text.to_string(),
            }]
        } else {
            self.set_state(ConversationState::Idle);
            Vec::new()
        };

        self.commit();
        effects
    }

    /// Playback for `turn` ended on its own
    pub fn on_playback_finished(&mut self, turn: u64) -> Vec<Effect> {
        if self.state != ConversationState::Speaking || turn != self.turn {
            tracing::debug!(turn, current = self.turn, "ignoring stale playback end");
            return Vec::new();
        }

        self.finish_speaking();
        self.commit();
        Vec::new()
    }

    /// The microphone heard speech; interrupts Neo if it is talking
    pub fn on_speech_detected(&mut self) -> Vec<Effect> {
        if self.state != ConversationState::Speaking {
            return Vec::new();
        }

        self.interrupt_speaking();
        self.commit();
        vec![Effect::StopPlayback]
    }

    /// Start listening without a wake word
    ///
    /// Returns false when busy or when voice input is unavailable.
    pub fn start_listening(&mut self) -> bool {
        if self.state != ConversationState::Idle || !self.caps.voice_input() {
            tracing::debug!(state = ?self.state, capabilities = ?self.caps, "cannot listen now");
            return false;
        }

        tracing::info!("listening on request");
        self.begin_listening();
        self.commit();
        true
    }

    /// Cancel listening, or cut a spoken reply short
    pub fn stop(&mut self) -> Vec<Effect> {
        let effects = match self.state {
            ConversationState::Listening => {
                tracing::info!("listening cancelled");
                self.stop_listening();
                Vec::new()
            }
            ConversationState::Speaking => {
                self.interrupt_speaking();
                vec![Effect::StopPlayback]
            }
            ConversationState::Idle | ConversationState::Thinking => Vec::new(),
        };

        self.commit();
        effects
    }

    /// Captured speech could not be transcribed
    pub fn on_transcription_failed(&mut self) {
        if matches!(
            self.state,
            ConversationState::Thinking | ConversationState::Speaking
        ) {
            tracing::debug!(state = ?self.state, "transcription failure ignored while busy");
            return;
        }

        self.transcript.push_agent(NOT_HEARD_REPLY);
        if self.state == ConversationState::Listening {
            self.stop_listening();
        }
        self.commit();
    }

    /// The microphone went away at runtime
    pub fn on_microphone_lost(&mut self) {
        self.caps.microphone = false;
        if self.state == ConversationState::Listening {
            self.stop_listening();
        }
        tracing::warn!("microphone unavailable, voice input disabled");
        self.commit();
    }

    /// Speech output went away at runtime
    pub fn on_speech_lost(&mut self) {
        self.caps.speech = false;
        tracing::warn!("speech output unavailable, replies will be shown only");
    }

    /// Fire every timer due at `now` (time since session start)
    pub fn tick(&mut self, now: Duration) {
        let mut fired = false;

        while let Some((handle, kind)) = self.sched.pop_due(now) {
            fired = true;
            if self.face.on_timer(handle, kind, &mut self.sched) {
                continue;
            }

            match kind {
                TimerKind::ListenTimeout => {
                    if self.listen_timer == Some(handle) {
                        self.listen_timer = None;
                        if self.state == ConversationState::Listening {
                            tracing::info!("listening timed out");
                            self.stop_listening();
                        }
                    }
                }
                TimerKind::Heartbeat => {
                    tracing::info!(
                        state = ?self.state,
                        emotion = ?self.face.emotion(),
                        turn = self.turn,
                        "heartbeat"
                    );
                    self.sched.schedule(HEARTBEAT_INTERVAL, TimerKind::Heartbeat);
                }
                TimerKind::Blink | TimerKind::BlinkEnd | TimerKind::MouthToggle => {}
            }
        }

        if fired {
            self.commit();
        }
    }

    /// Time until the next timer, measured from session start
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.sched.next_deadline()
    }

    fn begin_listening(&mut self) {
        self.cancel_listen_timer();
        self.set_state(ConversationState::Listening);
        self.face.set_emotion(EmotionState::Listen, &mut self.sched);
        self.listen_timer = Some(self.sched.schedule(LISTEN_TIMEOUT, TimerKind::ListenTimeout));
    }

    fn begin_thinking(&mut self, text: &str) -> Vec<Effect> {
        self.cancel_listen_timer();
        self.turn += 1;
        self.transcript.push_user(&self.child_name, text);
        self.set_state(ConversationState::Thinking);
        self.face.set_emotion(EmotionState::Think, &mut self.sched);

        vec![Effect::LookupReply {
            turn: self.turn,
            message: text.to_string(),
            child_name: self.child_name.clone(),
        }]
    }

    fn interrupt_speaking(&mut self) {
        self.interrupted = true;
        self.finish_speaking();
        tracing::info!(turn = self.turn, "speech interrupted by user");
    }

    fn finish_speaking(&mut self) {
        self.face.stop_mouth_animation(&mut self.sched);
        self.set_state(ConversationState::Idle);
        self.face.set_emotion(EmotionState::Happy, &mut self.sched);
    }

    fn stop_listening(&mut self) {
        self.cancel_listen_timer();
        self.set_state(ConversationState::Idle);
        self.face.set_emotion(EmotionState::Happy, &mut self.sched);
    }

    fn cancel_listen_timer(&mut self) {
        if let Some(handle) = self.listen_timer.take() {
            self.sched.cancel(handle);
        }
    }

    fn set_state(&mut self, next: ConversationState) {
        if next != self.state {
            tracing::debug!(from = ?self.state, to = ?next, turn = self.turn, "state transition");
            self.state = next;
        }
    }

    /// Present the frame and publish the snapshot for a finished transition
    fn commit(&mut self) {
        if let Some(frame) = self.face.take_frame() {
            self.canvas.draw(frame);
        }

        let snapshot = SessionSnapshot {
            state: self.state,
            emotion: self.face.emotion(),
            mouth_animating: self.face.is_mouth_animating(),
            turn: self.turn,
        };
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
