//! Drawing surface for the face
//!
//! The canvas holds the last presented [`FaceFrame`] and broadcasts every new frame to
//! subscribers (a window, a kiosk display, a trace logger). Frames are whole pictures,
//! so a subscriber never has to merge partial updates.

use tokio::sync::broadcast;

use crate::face::FaceFrame;

/// Channel capacity for frame updates
const CHANNEL_CAPACITY: usize = 64;

/// Face canvas
pub struct Canvas {
    /// Last frame drawn
    current: Option<FaceFrame>,
    /// Broadcast channel for frames
    tx: broadcast::Sender<FaceFrame>,
    /// Number of frames drawn so far
    frames_drawn: u64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create a blank canvas
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            current: None,
            tx,
            frames_drawn: 0,
        }
    }

    /// Subscribe to frame updates
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FaceFrame> {
        self.tx.subscribe()
    }

    /// Replace the picture with a new frame
    pub fn draw(&mut self, frame: FaceFrame) {
        tracing::trace!(
            emotion = ?frame.emotion,
            background = frame.background,
            mouth_open = frame.mouth.is_oval(),
            "frame drawn"
        );

        // Broadcast to subscribers (ignore errors if no subscribers)
        let _ = self.tx.send(frame.clone());

        self.current = Some(frame);
        self.frames_drawn += 1;
    }

    /// Last frame drawn
    #[must_use]
    pub const fn current(&self) -> Option<&FaceFrame> {
        self.current.as_ref()
    }

    /// Number of frames drawn since creation
    #[must_use]
    pub const fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}
