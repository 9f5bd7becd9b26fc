//! UI loop tests: events in, background work out, results back as events

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use neomind::chat::UNREACHABLE_REPLY;
use neomind::console::ConsoleCommand;
use neomind::face::{FaceRenderer, FaceStyle};
use neomind::session::{LISTEN_TIMEOUT, NOT_HEARD_REPLY};
use neomind::voice::{MicEvent, PlaybackOutcome, SpeechEngine, StopSignal, Transcriber};
use neomind::{
    App, AppEvent, Capabilities, ChatClient, ConversationState, EmotionState, Error, Flow,
    Services, SessionController,
};

mod common;
use common::{dead_url, options, session, spawn_server};

/// Speech engine that finishes instantly and keeps the stop signal of every utterance
#[derive(Default)]
struct RecordingSpeech {
    signals: Mutex<Vec<StopSignal>>,
}

impl RecordingSpeech {
    fn said(&self) -> usize {
        self.signals.lock().unwrap().len()
    }

    fn stopped(&self) -> usize {
        self.signals
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_raised())
            .count()
    }
}

#[async_trait]
impl SpeechEngine for RecordingSpeech {
    async fn say(&self, _text: &str, stop: StopSignal) -> neomind::Result<PlaybackOutcome> {
        let outcome = if stop.is_raised() {
            PlaybackOutcome::Interrupted
        } else {
            PlaybackOutcome::Finished
        };
        self.signals.lock().unwrap().push(stop);
        Ok(outcome)
    }
}

/// Speech engine whose device is gone
struct BrokenSpeech;

#[async_trait]
impl SpeechEngine for BrokenSpeech {
    async fn say(&self, _text: &str, _stop: StopSignal) -> neomind::Result<PlaybackOutcome> {
        Err(Error::Audio("no output device available".to_string()))
    }
}

/// Transcriber whose service is down
struct FailingTranscriber;

#[async_trait]
impl Transcriber for FailingTranscriber {
    async fn transcribe(&self, _wav: &[u8]) -> neomind::Result<String> {
        Err(Error::Stt("Whisper API error 503: unavailable".to_string()))
    }
}

fn services(url: String, speech: Option<Arc<dyn SpeechEngine>>) -> Services {
    Services {
        chat: ChatClient::new(url),
        transcriber: None,
        speech,
    }
}

/// A session whose face never blinks, so no timer runs while idle
fn still_session() -> SessionController {
    SessionController::new(
        options("Mia"),
        Capabilities::all(),
        FaceRenderer::new(FaceStyle::Still),
    )
}

/// Handle background events until the session settles back to idle
async fn settle(app: &mut App) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while app.session().state() != ConversationState::Idle {
            let event = app.next_event().await.expect("event channel closed");
            app.handle(event);
        }
    })
    .await
    .expect("session never went idle");
}

fn say(text: &str) -> AppEvent {
    AppEvent::Console(ConsoleCommand::Say(text.to_string()))
}

#[tokio::test]
async fn test_typed_hello_round_trip() {
    let (url, _) = spawn_server().await;
    let speech = Arc::new(RecordingSpeech::default());
    let mut app = App::new(
        session(Capabilities::all()),
        services(url, Some(speech.clone())),
    );

    assert_eq!(app.handle(say("hello")), Flow::Continue);
    assert_eq!(app.session().state(), ConversationState::Thinking);

    settle(&mut app).await;

    let transcript = app.session().transcript();
    assert_eq!(
        transcript.last().unwrap().text,
        "Hello Mia! How are you doing today? What would you like to learn about?"
    );
    assert_eq!(app.session().face().emotion(), EmotionState::Happy);
    assert_eq!(speech.said(), 1);
}

#[tokio::test]
async fn test_unreachable_server_still_answers() {
    let mut app = App::new(session(Capabilities::none()), services(dead_url().await, None));

    app.handle(say("hello"));
    settle(&mut app).await;

    assert_eq!(app.session().transcript().last().unwrap().text, UNREACHABLE_REPLY);
}

#[tokio::test]
async fn test_barge_in_stops_engine() {
    let (url, _) = spawn_server().await;
    let speech = Arc::new(RecordingSpeech::default());
    let mut app = App::new(
        session(Capabilities::all()),
        services(url, Some(speech.clone())),
    );

    app.handle(say("hello"));
    let reply = app.next_event().await.unwrap();
    assert!(matches!(reply, AppEvent::Reply { .. }));
    app.handle(reply);
    assert_eq!(app.session().state(), ConversationState::Speaking);

    // The child talks before the speech task has even started
    app.handle(AppEvent::Mic(MicEvent::SpeechDetected));
    assert_eq!(app.session().state(), ConversationState::Idle);
    assert!(app.session().was_interrupted());

    // The engine still sees the stop and ends early; its report changes nothing
    let ended = app.next_event().await.unwrap();
    assert!(matches!(
        ended,
        AppEvent::PlaybackEnded {
            outcome: PlaybackOutcome::Interrupted,
            ..
        }
    ));
    assert_eq!(speech.said(), 1);
    assert_eq!(speech.stopped(), 1);
    app.handle(ended);
    assert_eq!(app.session().state(), ConversationState::Idle);
}

#[tokio::test]
async fn test_stop_command_cuts_reply_short() {
    let (url, _) = spawn_server().await;
    let speech = Arc::new(RecordingSpeech::default());
    let mut app = App::new(
        session(Capabilities::all()),
        services(url, Some(speech.clone())),
    );

    app.handle(say("tell me a story"));
    let reply = app.next_event().await.unwrap();
    app.handle(reply);
    assert_eq!(app.session().state(), ConversationState::Speaking);

    app.handle(AppEvent::Console(ConsoleCommand::Stop));
    assert_eq!(app.session().state(), ConversationState::Idle);
    assert!(!app.session().face().is_mouth_animating());

    let ended = app.next_event().await.unwrap();
    assert!(matches!(
        ended,
        AppEvent::PlaybackEnded {
            outcome: PlaybackOutcome::Interrupted,
            ..
        }
    ));
}

#[tokio::test]
async fn test_speech_failure_disables_speech() {
    let (url, _) = spawn_server().await;
    let mut app = App::new(
        session(Capabilities::all()),
        services(url, Some(Arc::new(BrokenSpeech))),
    );

    app.handle(say("hello"));
    settle(&mut app).await;
    assert!(!app.session().capabilities().speech);

    // Later replies go straight back to idle
    app.handle(say("let's play a game"));
    let reply = app.next_event().await.unwrap();
    app.handle(reply);
    assert_eq!(app.session().state(), ConversationState::Idle);
}

#[tokio::test]
async fn test_console_commands() {
    let mut app = App::new(session(Capabilities::none()), services(dead_url().await, None));

    app.handle(AppEvent::Console(ConsoleCommand::Name("Leo".to_string())));
    assert_eq!(app.session().child_name(), "Leo");

    app.handle(AppEvent::Console(ConsoleCommand::Health));
    let status = app.next_event().await.unwrap();
    assert!(matches!(status, AppEvent::Health(ref s) if !s.is_healthy()));
    assert_eq!(app.handle(status), Flow::Continue);

    assert_eq!(app.handle(AppEvent::Console(ConsoleCommand::Quit)), Flow::Quit);
}

#[tokio::test]
async fn test_microphone_loss_is_not_fatal() {
    let mut app = App::new(session(Capabilities::all()), services(dead_url().await, None));

    app.handle(AppEvent::Transcript("hello Neo".to_string()));
    assert_eq!(app.session().state(), ConversationState::Listening);

    app.handle(AppEvent::Mic(MicEvent::Unavailable("device unplugged".to_string())));
    assert_eq!(app.session().state(), ConversationState::Idle);
    assert!(!app.session().capabilities().microphone);
}

#[tokio::test]
async fn test_listen_and_stop_commands() {
    let mut app = App::new(session(Capabilities::all()), services(dead_url().await, None));

    app.handle(AppEvent::Console(ConsoleCommand::Listen));
    assert_eq!(app.session().state(), ConversationState::Listening);
    assert_eq!(app.session().face().emotion(), EmotionState::Listen);

    // No wake word needed once listening
    app.handle(AppEvent::Transcript("what do owls eat".to_string()));
    assert_eq!(app.session().state(), ConversationState::Thinking);
    settle(&mut app).await;

    app.handle(AppEvent::Console(ConsoleCommand::Listen));
    app.handle(AppEvent::Console(ConsoleCommand::Stop));
    assert_eq!(app.session().state(), ConversationState::Idle);
    assert_eq!(app.session().face().emotion(), EmotionState::Happy);
}

#[tokio::test]
async fn test_listen_without_voice_input() {
    let mut app = App::new(session(Capabilities::none()), services(dead_url().await, None));

    assert_eq!(
        app.handle(AppEvent::Console(ConsoleCommand::Listen)),
        Flow::Continue
    );
    assert_eq!(app.session().state(), ConversationState::Idle);
}

#[tokio::test]
async fn test_failed_transcription_is_shown() {
    let mut services = services(dead_url().await, None);
    services.transcriber = Some(Arc::new(FailingTranscriber));
    let mut app = App::new(session(Capabilities::all()), services);

    app.handle(AppEvent::Transcript("hey Neo".to_string()));
    assert_eq!(app.session().state(), ConversationState::Listening);
    let lines = app.session().transcript().len();

    app.handle(AppEvent::Mic(MicEvent::Utterance(vec![0.2; 1600])));
    let event = tokio::time::timeout(Duration::from_secs(5), app.next_event())
        .await
        .expect("no event after failed transcription")
        .unwrap();
    assert!(matches!(event, AppEvent::TranscriptionFailed(ref e) if e.contains("503")));
    app.handle(event);

    let transcript = app.session().transcript();
    assert_eq!(transcript.len(), lines + 1);
    assert_eq!(transcript.last().unwrap().text, NOT_HEARD_REPLY);
    assert_eq!(app.session().state(), ConversationState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_wake_word_after_long_idle_gets_full_listen_window() {
    let mut app = App::new(
        still_session(),
        services("http://127.0.0.1:9".to_string(), None),
    );
    assert_eq!(app.session().next_deadline(), None);

    tokio::time::advance(Duration::from_secs(9)).await;
    app.handle(AppEvent::Transcript("hey Neo".to_string()));
    assert_eq!(app.session().state(), ConversationState::Listening);
    assert!(app.session().next_deadline() >= Some(Duration::from_secs(9) + LISTEN_TIMEOUT));

    app.tick();
    assert_eq!(app.session().state(), ConversationState::Listening);

    tokio::time::advance(LISTEN_TIMEOUT - Duration::from_secs(1)).await;
    app.tick();
    assert_eq!(app.session().state(), ConversationState::Listening);

    tokio::time::advance(Duration::from_secs(2)).await;
    app.tick();
    assert_eq!(app.session().state(), ConversationState::Idle);
}
