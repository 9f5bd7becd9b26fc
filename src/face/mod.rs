//! Animated face
//!
//! [`FaceRenderer`] owns the displayed emotion plus two independent animations: a blink
//! loop that runs for the whole session (suspended while listening) and a mouth flap
//! that runs while speaking. Both are driven by [`Scheduler`] timers. Changes only mark
//! the face dirty; [`FaceRenderer::take_frame`] produces the frame once per handled
//! event so a canvas never sees half of a transition.

pub mod geometry;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::scheduler::{Scheduler, TimerHandle, TimerKind};
use crate::Error;

pub use geometry::{FaceFrame, Shape};

/// Shortest pause between blinks
pub const BLINK_MIN: Duration = Duration::from_millis(3000);

/// Longest pause between blinks
pub const BLINK_MAX: Duration = Duration::from_millis(6000);

/// How long the eyes stay shut
pub const BLINK_DURATION: Duration = Duration::from_millis(120);

/// Mouth open/closed period while speaking
pub const MOUTH_PERIOD: Duration = Duration::from_millis(160);

/// Emotional state shown on the face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionState {
    #[default]
    Happy,
    Excited,
    Think,
    Listen,
    Confused,
    /// Eyes shut mid-blink; only ever shown by the blink timer
    Blink,
}

impl EmotionState {
    /// Every emotion, blink included
    pub const ALL: [Self; 6] = [
        Self::Happy,
        Self::Excited,
        Self::Think,
        Self::Listen,
        Self::Confused,
        Self::Blink,
    ];

    /// Caption text
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Happy => "Happy :)",
            Self::Excited => "Excited :D",
            Self::Think => "Thinking...",
            Self::Listen => "Listening |",
            Self::Confused => "Confused ?",
            Self::Blink => "Blinking",
        }
    }
}

impl fmt::Display for EmotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How much animation the face carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaceStyle {
    /// Blinking eyes and a flapping mouth
    #[default]
    Animated,
    /// No blinking; the mouth still moves while speaking
    Still,
}

impl FaceStyle {
    /// Whether the blink loop runs
    #[must_use]
    pub const fn blinks(self) -> bool {
        matches!(self, Self::Animated)
    }
}

impl FromStr for FaceStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "animated" => Ok(Self::Animated),
            "still" => Ok(Self::Still),
            other => Err(Error::Config(format!(
                "unknown face style {other:?} (expected \"animated\" or \"still\")"
            ))),
        }
    }
}

/// Renders the face and runs its animations
#[derive(Debug)]
pub struct FaceRenderer {
    style: FaceStyle,
    emotion: EmotionState,
    blinking: bool,
    mouth_open: bool,
    blink_timer: Option<TimerHandle>,
    blink_end_timer: Option<TimerHandle>,
    mouth_timer: Option<TimerHandle>,
    dirty: bool,
    rng: StdRng,
}

impl FaceRenderer {
    /// Create a renderer showing a happy face
    #[must_use]
    pub fn new(style: FaceStyle) -> Self {
        Self::with_rng(style, StdRng::from_entropy())
    }

    /// Create a renderer with a fixed blink RNG
    #[must_use]
    pub fn with_rng(style: FaceStyle, rng: StdRng) -> Self {
        Self {
            style,
            emotion: EmotionState::Happy,
            blinking: false,
            mouth_open: false,
            blink_timer: None,
            blink_end_timer: None,
            mouth_timer: None,
            dirty: true,
            rng,
        }
    }

    /// Start the blink loop
    pub fn start(&mut self, sched: &mut Scheduler) {
        self.resume_blink(sched);
        self.dirty = true;
    }

    /// Emotion last set by the session
    #[must_use]
    pub const fn emotion(&self) -> EmotionState {
        self.emotion
    }

    /// Emotion the eyes currently show
    #[must_use]
    pub const fn displayed_emotion(&self) -> EmotionState {
        if self.blinking {
            EmotionState::Blink
        } else {
            self.emotion
        }
    }

    /// Whether the eyes are shut mid-blink
    #[must_use]
    pub const fn is_blinking(&self) -> bool {
        self.blinking
    }

    /// Whether the mouth is currently drawn open
    #[must_use]
    pub const fn is_mouth_open(&self) -> bool {
        self.mouth_open
    }

    /// Whether the mouth animation is running
    #[must_use]
    pub const fn is_mouth_animating(&self) -> bool {
        self.mouth_timer.is_some()
    }

    /// Whether a blink is waiting to happen
    #[must_use]
    pub const fn is_blink_scheduled(&self) -> bool {
        self.blink_timer.is_some()
    }

    /// Show an emotion
    ///
    /// `Blink` is owned by the blink timer and is ignored here. Listening suspends
    /// blinking so the eyes stay fully open; any other emotion resumes it.
    pub fn set_emotion(&mut self, emotion: EmotionState, sched: &mut Scheduler) {
        if emotion == EmotionState::Blink {
            tracing::warn!("blink can only be shown by the blink timer");
            return;
        }

        if emotion != self.emotion {
            tracing::debug!(from = ?self.emotion, to = ?emotion, "emotion changed");
            self.emotion = emotion;
            self.dirty = true;
        }

        if emotion == EmotionState::Listen {
            self.suspend_blink(sched);
        } else {
            self.resume_blink(sched);
        }
    }

    /// Start flapping the mouth; no-op if already running
    pub fn start_mouth_animation(&mut self, sched: &mut Scheduler) {
        if self.mouth_timer.is_some() {
            return;
        }

        self.mouth_open = true;
        self.dirty = true;
        self.mouth_timer = Some(sched.schedule(MOUTH_PERIOD, TimerKind::MouthToggle));
    }

    /// Stop the mouth animation and close the mouth; no-op if not running
    pub fn stop_mouth_animation(&mut self, sched: &mut Scheduler) {
        if let Some(handle) = self.mouth_timer.take() {
            sched.cancel(handle);
        }

        if self.mouth_open {
            self.mouth_open = false;
            self.dirty = true;
        }
    }

    /// Handle a face timer
    ///
    /// Returns false for timers the face doesn't own.
    pub fn on_timer(&mut self, handle: TimerHandle, kind: TimerKind, sched: &mut Scheduler) -> bool {
        match kind {
            TimerKind::Blink => {
                if self.blink_timer != Some(handle) {
                    return true;
                }
                self.blink_timer = None;
                self.blinking = true;
                self.dirty = true;
                self.blink_end_timer = Some(sched.schedule(BLINK_DURATION, TimerKind::BlinkEnd));
            }
            TimerKind::BlinkEnd => {
                if self.blink_end_timer != Some(handle) {
                    return true;
                }
                self.blink_end_timer = None;
                self.blinking = false;
                self.dirty = true;
                self.schedule_blink(sched);
            }
            TimerKind::MouthToggle => {
                if self.mouth_timer != Some(handle) {
                    return true;
                }
                self.mouth_open = !self.mouth_open;
                self.dirty = true;
                self.mouth_timer = Some(sched.schedule(MOUTH_PERIOD, TimerKind::MouthToggle));
            }
            TimerKind::ListenTimeout | TimerKind::Heartbeat => return false,
        }

        true
    }

    /// Current frame, regardless of whether anything changed
    #[must_use]
    pub fn frame(&self) -> FaceFrame {
        geometry::frame(self.emotion, self.displayed_emotion(), self.mouth_open)
    }

    /// Frame to present if anything changed since the last one
    pub fn take_frame(&mut self) -> Option<FaceFrame> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.frame())
    }

    fn suspend_blink(&mut self, sched: &mut Scheduler) {
        if let Some(handle) = self.blink_timer.take() {
            sched.cancel(handle);
        }
        if let Some(handle) = self.blink_end_timer.take() {
            sched.cancel(handle);
        }
        if self.blinking {
            self.blinking = false;
            self.dirty = true;
        }
    }

    fn resume_blink(&mut self, sched: &mut Scheduler) {
        if !self.style.blinks() || self.emotion == EmotionState::Listen {
            return;
        }
        if self.blink_timer.is_none() && self.blink_end_timer.is_none() {
            self.schedule_blink(sched);
        }
    }

    fn schedule_blink(&mut self, sched: &mut Scheduler) {
        #[allow(clippy::cast_possible_truncation)]
        let delay_ms = self
            .rng
            .gen_range(BLINK_MIN.as_millis() as u64..=BLINK_MAX.as_millis() as u64);
        self.blink_timer = Some(sched.schedule(Duration::from_millis(delay_ms), TimerKind::Blink));
    }
}
