//! NeoMind - Voice companion for children
//!
//! This library provides the core functionality for the NeoMind companion:
//! - An animated face with emotions, blinking, and a talking mouth
//! - The turn-taking session (idle, listening, thinking, speaking)
//! - Voice processing (capture, segmentation, wake words, STT, TTS)
//! - A client and a small keyword-reply server for the chat service
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Front end (console)                 │
//! └────────────────────┬────────────────────────────────┘
//!                      │ events
//! ┌────────────────────▼────────────────────────────────┐
//! │                     App loop                         │
//! │   Session  │  Face  │  Scheduler  │  Canvas          │
//! └────────────────────┬────────────────────────────────┘
//!                      │ effects
//! ┌────────────────────▼────────────────────────────────┐
//! │          Background work                            │
//! │   Chat service  │  Mic thread  │  STT  │  TTS        │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod canvas;
pub mod capabilities;
pub mod chat;
pub mod config;
pub mod console;
pub mod error;
pub mod face;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod voice;

pub use app::{App, AppEvent, Flow, Services};
pub use canvas::Canvas;
pub use capabilities::Capabilities;
pub use chat::{ChatClient, HealthStatus};
pub use config::Config;
pub use error::{Error, Result};
pub use face::{EmotionState, FaceFrame, FaceRenderer, FaceStyle, Shape};
pub use scheduler::{Scheduler, TimerHandle, TimerKind};
pub use server::CompanionServer;
pub use session::{ConversationState, Effect, SessionController, SessionOptions, SessionSnapshot};
