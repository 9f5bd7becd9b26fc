//! Face geometry on a 480x320 surface
//!
//! Everything here is a pure function of the emotion and mouth state, so the same input
//! always yields the same shape set.

use serde::Serialize;

use super::EmotionState;

/// Surface width in pixels
pub const WIDTH: f32 = 480.0;

/// Surface height in pixels
pub const HEIGHT: f32 = 320.0;

/// Eye colour
pub const CYAN: &str = "#00FFCC";

const EYE_SIZE: f32 = 80.0;
const LEFT_EYE_X: f32 = WIDTH * 0.25 - EYE_SIZE / 2.0;
const RIGHT_EYE_X: f32 = WIDTH * 0.75 - EYE_SIZE / 2.0;
const EYE_Y: f32 = HEIGHT * 0.35 - EYE_SIZE / 2.0;

/// Growth on each side for excited eyes
const EXCITED_GROWTH: f32 = 10.0;

/// Upward shift for thinking eyes
const THINK_LIFT: f32 = 15.0;

/// Thickness of a closed eye or closed mouth
const BAR_HEIGHT: f32 = 8.0;

const MOUTH_WIDTH: f32 = 180.0;
const MOUTH_HEIGHT: f32 = 60.0;
const MOUTH_Y: f32 = HEIGHT * 0.7;

/// A filled shape in surface coordinates (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Ellipse inscribed in the bounding box
    Oval { x: f32, y: f32, width: f32, height: f32 },
    /// Axis-aligned rectangle
    Rect { x: f32, y: f32, width: f32, height: f32 },
}

impl Shape {
    /// Whether this shape is an ellipse
    #[must_use]
    pub const fn is_oval(&self) -> bool {
        matches!(self, Self::Oval { .. })
    }

    /// Top edge of the bounding box
    #[must_use]
    pub const fn top(&self) -> f32 {
        match self {
            Self::Oval { y, .. } | Self::Rect { y, .. } => *y,
        }
    }

    /// Width of the bounding box
    #[must_use]
    pub const fn width(&self) -> f32 {
        match self {
            Self::Oval { width, .. } | Self::Rect { width, .. } => *width,
        }
    }
}

/// One complete picture of the face
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceFrame {
    /// Emotion the frame was drawn for (`Blink` while the eyes are shut)
    pub emotion: EmotionState,
    /// Caption under the face
    pub label: String,
    /// Background colour name
    pub background: &'static str,
    /// Left and right eye
    pub eyes: [Shape; 2],
    /// Mouth
    pub mouth: Shape,
}

fn open_eye(x: f32) -> Shape {
    Shape::Oval {
        x,
        y: EYE_Y,
        width: EYE_SIZE,
        height: EYE_SIZE,
    }
}

fn closed_eye(x: f32) -> Shape {
    Shape::Rect {
        x,
        y: EYE_Y + EYE_SIZE / 2.0 - BAR_HEIGHT / 2.0,
        width: EYE_SIZE,
        height: BAR_HEIGHT,
    }
}

fn excited_eye(x: f32) -> Shape {
    Shape::Oval {
        x: x - EXCITED_GROWTH,
        y: EYE_Y - EXCITED_GROWTH,
        width: EYE_SIZE + EXCITED_GROWTH * 2.0,
        height: EYE_SIZE + EXCITED_GROWTH * 2.0,
    }
}

fn raised_eye(x: f32) -> Shape {
    Shape::Oval {
        x,
        y: EYE_Y - THINK_LIFT,
        width: EYE_SIZE,
        height: EYE_SIZE,
    }
}

/// Eye shapes for an emotion, left then right
#[must_use]
pub fn eye_shapes(emotion: EmotionState) -> [Shape; 2] {
    match emotion {
        EmotionState::Happy | EmotionState::Listen => {
            [open_eye(LEFT_EYE_X), open_eye(RIGHT_EYE_X)]
        }
        EmotionState::Excited => [excited_eye(LEFT_EYE_X), excited_eye(RIGHT_EYE_X)],
        EmotionState::Think => [raised_eye(LEFT_EYE_X), raised_eye(RIGHT_EYE_X)],
        EmotionState::Confused => [open_eye(LEFT_EYE_X), closed_eye(RIGHT_EYE_X)],
        EmotionState::Blink => [closed_eye(LEFT_EYE_X), closed_eye(RIGHT_EYE_X)],
    }
}

/// Mouth shape
#[must_use]
pub fn mouth_shape(open: bool) -> Shape {
    let x = WIDTH / 2.0 - MOUTH_WIDTH / 2.0;
    if open {
        Shape::Oval {
            x,
            y: MOUTH_Y - MOUTH_HEIGHT / 2.0,
            width: MOUTH_WIDTH,
            height: MOUTH_HEIGHT,
        }
    } else {
        Shape::Rect {
            x,
            y: MOUTH_Y - BAR_HEIGHT / 2.0,
            width: MOUTH_WIDTH,
            height: BAR_HEIGHT,
        }
    }
}

/// Background colour behind the face
#[must_use]
pub const fn background(emotion: EmotionState) -> &'static str {
    match emotion {
        EmotionState::Happy => "lightyellow",
        EmotionState::Excited => "lightpink",
        EmotionState::Think => "lightcyan",
        EmotionState::Listen => "lightblue",
        EmotionState::Confused => "wheat",
        EmotionState::Blink => "lightgray",
    }
}

/// Build a full frame
///
/// `mood` picks the caption and background, `shown` picks the eyes; they only differ
/// while a blink is in progress.
#[must_use]
pub fn frame(mood: EmotionState, shown: EmotionState, mouth_open: bool) -> FaceFrame {
    FaceFrame {
        emotion: shown,
        label: format!("Neo is {}", mood.label()),
        background: background(mood),
        eyes: eye_shapes(shown),
        mouth: mouth_shape(mouth_open),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_and_listen_share_open_eyes() {
        let happy = eye_shapes(EmotionState::Happy);
        assert!(happy.iter().all(Shape::is_oval));
        assert_eq!(happy, eye_shapes(EmotionState::Listen));
        assert_eq!(happy[0], Shape::Oval { x: 80.0, y: 72.0, width: 80.0, height: 80.0 });
        assert_eq!(happy[1], Shape::Oval { x: 320.0, y: 72.0, width: 80.0, height: 80.0 });
    }

    #[test]
    fn test_excited_eyes_are_larger() {
        let happy = eye_shapes(EmotionState::Happy);
        let excited = eye_shapes(EmotionState::Excited);
        assert!(excited.iter().all(Shape::is_oval));
        assert!(excited[0].width() > happy[0].width());
        assert!(excited[1].width() > happy[1].width());
    }

    #[test]
    fn test_think_eyes_shift_up() {
        let happy = eye_shapes(EmotionState::Happy);
        let think = eye_shapes(EmotionState::Think);
        assert!(think.iter().all(Shape::is_oval));
        assert!(think[0].top() < happy[0].top());
        assert!((happy[0].top() - think[0].top() - THINK_LIFT).abs() < f32::EPSILON);
    }

    #[test]
    fn test_confused_is_asymmetric() {
        let [left, right] = eye_shapes(EmotionState::Confused);
        assert!(left.is_oval());
        assert!(!right.is_oval());
    }

    #[test]
    fn test_blink_closes_both_eyes() {
        let [left, right] = eye_shapes(EmotionState::Blink);
        assert_eq!(left, Shape::Rect { x: 80.0, y: 108.0, width: 80.0, height: 8.0 });
        assert!(!right.is_oval());
    }

    #[test]
    fn test_geometry_is_deterministic() {
        for emotion in EmotionState::ALL {
            assert_eq!(eye_shapes(emotion), eye_shapes(emotion));
        }
    }

    #[test]
    fn test_mouth_shapes() {
        assert!(mouth_shape(true).is_oval());
        assert!(!mouth_shape(false).is_oval());
        assert!((mouth_shape(true).width() - MOUTH_WIDTH).abs() < f32::EPSILON);
    }

    #[test]
    fn test_frame_label_and_background() {
        let f = frame(EmotionState::Excited, EmotionState::Blink, false);
        assert_eq!(f.label, "Neo is Excited :D");
        assert_eq!(f.background, "lightpink");
        assert_eq!(f.emotion, EmotionState::Blink);
        assert_eq!(f.eyes, eye_shapes(EmotionState::Blink));
    }
}
