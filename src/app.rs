//! Companion UI loop
//!
//! One task owns the session and applies every event to it in order. Chat lookups,
//! transcription, and speech run on background tasks and report back as events, so
//! animation timers keep firing while they are in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use crate::Result;
use crate::capabilities::Capabilities;
use crate::chat::{ChatClient, HealthStatus};
use crate::config::Config;
use crate::console::{self, ConsoleCommand, ConsoleView, HELP};
use crate::face::{FaceFrame, FaceRenderer};
use crate::session::{Effect, SessionController, SessionOptions};
use crate::voice::{
    CloudSpeech, MicEvent, PlaybackOutcome, SpeechEngine, StopSignal, Transcriber,
    WhisperTranscriber, spawn_listener, transcribe_samples,
};

/// Something the UI loop must react to
#[derive(Debug)]
pub enum AppEvent {
    /// A console line
    Console(ConsoleCommand),
    /// Microphone activity
    Mic(MicEvent),
    /// Speech was transcribed
    Transcript(String),
    /// Speech could not be transcribed
    TranscriptionFailed(String),
    /// The chat service answered a turn
    Reply { turn: u64, text: String },
    /// Playback for a turn ended
    PlaybackEnded { turn: u64, outcome: PlaybackOutcome },
    /// The speech engine failed for a turn
    SpeechFailed { turn: u64, error: String },
    /// A health check finished
    Health(HealthStatus),
}

impl From<ConsoleCommand> for AppEvent {
    fn from(command: ConsoleCommand) -> Self {
        Self::Console(command)
    }
}

impl From<MicEvent> for AppEvent {
    fn from(event: MicEvent) -> Self {
        Self::Mic(event)
    }
}

/// Whether the loop keeps going after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// External services the loop calls out to
#[derive(Clone)]
pub struct Services {
    pub chat: ChatClient,
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub speech: Option<Arc<dyn SpeechEngine>>,
}

impl Services {
    /// Build the services the configuration and detected capabilities allow
    #[must_use]
    pub fn from_config(config: &Config, caps: &mut Capabilities) -> Self {
        let api_key = config.api_keys.openai.clone().unwrap_or_default();

        let transcriber: Option<Arc<dyn Transcriber>> = if caps.transcription {
            match WhisperTranscriber::new(api_key.clone(), config.voice.stt_model.clone()) {
                Ok(t) => Some(Arc::new(t)),
                Err(e) => {
                    tracing::warn!(error = %e, "transcription unavailable");
                    caps.transcription = false;
                    None
                }
            }
        } else {
            None
        };

        #[allow(clippy::cast_possible_truncation)]
        let speed = config.voice.tts_speed as f32;
        let speech: Option<Arc<dyn SpeechEngine>> = if caps.speech {
            match CloudSpeech::new(
                api_key,
                config.voice.tts_model.clone(),
                config.voice.tts_voice.clone(),
                speed,
            ) {
                Ok(s) => Some(Arc::new(s)),
                Err(e) => {
                    tracing::warn!(error = %e, "speech output unavailable");
                    caps.speech = false;
                    None
                }
            }
        } else {
            None
        };

        Self {
            chat: ChatClient::new(config.server_url.clone()),
            transcriber,
            speech,
        }
    }
}

/// The companion application
pub struct App {
    session: SessionController,
    services: Services,
    view: ConsoleView,
    playing: Option<StopSignal>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    started: Instant,
}

impl App {
    /// Create the app around a session
    #[must_use]
    pub fn new(session: SessionController, services: Services) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            session,
            services,
            view: ConsoleView::new(),
            playing: None,
            events_tx,
            events_rx,
            started: Instant::now(),
        }
    }

    /// Build the app from configuration, probing devices and credentials
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let mut caps = Capabilities::detect(config);
        let services = Services::from_config(config, &mut caps);
        let session = SessionController::new(
            SessionOptions::from_config(config),
            caps,
            FaceRenderer::new(config.face),
        );
        Self::new(session, services)
    }

    /// The session
    #[must_use]
    pub const fn session(&self) -> &SessionController {
        &self.session
    }

    /// Wait for the next event from a background task
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }

    /// Run until `/quit`, end of input, or Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if the microphone thread cannot be started
    pub async fn run(mut self) -> Result<()> {
        let shutdown = Arc::new(AtomicBool::new(false));

        let _mic = if self.session.capabilities().voice_input() {
            Some(spawn_listener(
                self.session.subscribe(),
                self.events_tx.clone(),
                Arc::clone(&shutdown),
            )?)
        } else {
            None
        };

        tokio::spawn(console::read_stdin(self.events_tx.clone()));
        tokio::spawn(trace_frames(self.session.subscribe_frames()));

        println!("{HELP}");
        self.view.render(&self.session);

        loop {
            let deadline = self.session.next_deadline().map(|d| self.started + d);

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted");
                    break;
                }
                Some(event) = self.events_rx.recv() => {
                    if self.handle(event) == Flow::Quit {
                        break;
                    }
                }
                () = sleep_until(deadline) => {
                    self.tick();
                }
            }

            self.view.render(&self.session);
        }

        shutdown.store(true, Ordering::Relaxed);
        self.stop_playback();

        tracing::info!("goodbye");
        Ok(())
    }

    /// Fire timers due by now
    pub fn tick(&mut self) {
        self.session.tick(self.started.elapsed());
    }

    /// Apply one event to the session and start whatever work it asks for
    ///
    /// Timers due by now fire first, so anything the event schedules is measured
    /// from the moment it arrived.
    pub fn handle(&mut self, event: AppEvent) -> Flow {
        self.tick();

        let effects = match event {
            AppEvent::Console(command) => return self.handle_command(command),
            AppEvent::Mic(MicEvent::SpeechDetected) => self.session.on_speech_detected(),
            AppEvent::Mic(MicEvent::Utterance(samples)) => {
                self.transcribe(samples);
                Vec::new()
            }
            AppEvent::Mic(MicEvent::Unavailable(reason)) => {
                tracing::warn!(reason = %reason, "microphone lost");
                self.session.on_microphone_lost();
                Vec::new()
            }
            AppEvent::Transcript(text) => self.session.on_transcript(&text),
            AppEvent::TranscriptionFailed(error) => {
                tracing::warn!(error = %error, "transcription failed");
                self.session.on_transcription_failed();
                Vec::new()
            }
            AppEvent::Reply { turn, text } => self.session.on_reply(turn, &text),
            AppEvent::PlaybackEnded { turn, outcome } => {
                tracing::debug!(turn, ?outcome, "playback ended");
                self.session.on_playback_finished(turn)
            }
            AppEvent::SpeechFailed { turn, error } => {
                tracing::error!(turn, error = %error, "speech failed");
                self.services.speech = None;
                self.session.on_speech_lost();
                self.session.on_playback_finished(turn)
            }
            AppEvent::Health(status) => {
                println!("Server {}: {status}", self.services.chat.base_url());
                Vec::new()
            }
        };

        self.apply(effects);
        Flow::Continue
    }

    fn handle_command(&mut self, command: ConsoleCommand) -> Flow {
        match command {
            ConsoleCommand::Say(text) => {
                let effects = self.session.submit_text(&text);
                self.apply(effects);
            }
            ConsoleCommand::Health => {
                let chat = self.services.chat.clone();
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    let _ = events.send(AppEvent::Health(chat.health().await));
                });
            }
            ConsoleCommand::Listen => {
                if !self.session.start_listening() {
                    println!("Neo can't listen right now");
                }
            }
            ConsoleCommand::Stop => {
                let effects = self.session.stop();
                self.apply(effects);
            }
            ConsoleCommand::Name(name) => {
                self.session.set_child_name(&name);
                println!("Hi {}!", self.session.child_name());
            }
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Unknown(name) => println!("Unknown command /{name}\n{HELP}"),
            ConsoleCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LookupReply {
                    turn,
                    message,
                    child_name,
                } => {
                    let chat = self.services.chat.clone();
                    let events = self.events_tx.clone();
                    tokio::spawn(async move {
                        let text = chat.reply(&message, &child_name).await;
                        let _ = events.send(AppEvent::Reply { turn, text });
                    });
                }
                Effect::Speak { turn, text } => {
                    let events = self.events_tx.clone();
                    let Some(speech) = self.services.speech.clone() else {
                        let _ = events.send(AppEvent::SpeechFailed {
                            turn,
                            error: "no speech engine".to_string(),
                        });
                        continue;
                    };
                    // A stop that lands before the task runs still reaches it
                    let stop = StopSignal::new();
                    if let Some(previous) = self.playing.replace(stop.clone()) {
                        previous.raise();
                    }
                    tokio::spawn(async move {
                        let event = match speech.say(&text, stop).await {
                            Ok(outcome) => AppEvent::PlaybackEnded { turn, outcome },
                            Err(e) => AppEvent::SpeechFailed {
                                turn,
                                error: e.to_string(),
                            },
                        };
                        let _ = events.send(event);
                    });
                }
                Effect::StopPlayback => self.stop_playback(),
            }
        }
    }

    fn stop_playback(&mut self) {
        if let Some(stop) = self.playing.take() {
            stop.raise();
        }
    }

    fn transcribe(&self, samples: Vec<f32>) {
        let Some(transcriber) = self.services.transcriber.clone() else {
            tracing::debug!("utterance dropped, no transcriber");
            return;
        };

        let events = self.events_tx.clone();
        tokio::spawn(async move {
            match transcribe_samples(transcriber.as_ref(), &samples).await {
                Ok(text) if !text.is_empty() => {
                    let _ = events.send(AppEvent::Transcript(text));
                }
                Ok(_) => tracing::debug!("empty transcript"),
                Err(e) => {
                    let _ = events.send(AppEvent::TranscriptionFailed(e.to_string()));
                }
            }
        });
    }
}

/// Log every presented frame at trace level
async fn trace_frames(mut frames: broadcast::Receiver<FaceFrame>) {
    loop {
        match frames.recv().await {
            Ok(frame) => tracing::trace!(
                emotion = ?frame.emotion,
                eyes = ?frame.eyes,
                mouth = ?frame.mouth,
                "frame presented"
            ),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::trace!(skipped, "frame log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => futures::future::pending().await,
    }
}
