use rand::distributions::{Distribution, Standard};
use rand::Rng;

/// Direction of a swipe recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Screen edge a pan must start from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Edge {
    Left,
    Right,
}

/// What the recognition surface has to be configured with to detect a gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recognizer {
    Tap { count: u8, touches: u8 },
    Rotation,
    Magnification,
    Swipe { direction: SwipeDirection, touches: u8 },
    LongPress { touches: u8, min_duration_secs: Option<f64> },
    EdgePan { edge: Edge },
}

impl Recognizer {
    pub fn touches(&self) -> u8 {
        match *self {
            Recognizer::Tap { touches, .. }
            | Recognizer::Swipe { touches, .. }
            | Recognizer::LongPress { touches, .. } => touches,
            Recognizer::Rotation | Recognizer::Magnification => 2,
            Recognizer::EdgePan { .. } => 1,
        }
    }
}

/// Every gesture a lock can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum GestureKind {
    #[strum(serialize = "Double Tap")]
    DoubleTap,
    #[strum(serialize = "Triple Tap")]
    TripleTap,
    Rotate,
    Pinch,
    #[strum(serialize = "Two Finger Tap")]
    TwoFingerTap,
    #[strum(serialize = "Three Finger Tap")]
    ThreeFingerTap,
    #[strum(serialize = "Left Swipe")]
    LeftSwipe,
    #[strum(serialize = "Right Swipe")]
    RightSwipe,
    #[strum(serialize = "Up Swipe")]
    UpSwipe,
    #[strum(serialize = "Down Swipe")]
    DownSwipe,
    #[strum(serialize = "Two Finger Left Swipe")]
    TwoFingerLeftSwipe,
    #[strum(serialize = "Two Finger Right Swipe")]
    TwoFingerRightSwipe,
    #[strum(serialize = "Two Finger Up Swipe")]
    TwoFingerUpSwipe,
    #[strum(serialize = "Two Finger Down Swipe")]
    TwoFingerDownSwipe,
    #[strum(serialize = "Long Press")]
    LongPress,
    #[strum(serialize = "Two Finger Long Press")]
    TwoFingerLongPress,
    #[strum(serialize = "Three Finger Long Press")]
    ThreeFingerLongPress,
    #[strum(serialize = "Left Edge Pan")]
    LeftEdgePan,
    #[strum(serialize = "Right Edge Pan")]
    RightEdgePan,
    #[strum(serialize = "Three Finger Left Swipe")]
    ThreeFingerLeftSwipe,
    #[strum(serialize = "Three Finger Right Swipe")]
    ThreeFingerRightSwipe,
    #[strum(serialize = "Three Finger Up Swipe")]
    ThreeFingerUpSwipe,
    #[strum(serialize = "Three Finger Down Swipe")]
    ThreeFingerDownSwipe,
}

impl GestureKind {
    pub const ALL: [GestureKind; 23] = [
        GestureKind::DoubleTap,
        GestureKind::TripleTap,
        GestureKind::Rotate,
        GestureKind::Pinch,
        GestureKind::TwoFingerTap,
        GestureKind::ThreeFingerTap,
        GestureKind::LeftSwipe,
        GestureKind::RightSwipe,
        GestureKind::UpSwipe,
        GestureKind::DownSwipe,
        GestureKind::TwoFingerLeftSwipe,
        GestureKind::TwoFingerRightSwipe,
        GestureKind::TwoFingerUpSwipe,
        GestureKind::TwoFingerDownSwipe,
        GestureKind::LongPress,
        GestureKind::TwoFingerLongPress,
        GestureKind::ThreeFingerLongPress,
        GestureKind::LeftEdgePan,
        GestureKind::RightEdgePan,
        GestureKind::ThreeFingerLeftSwipe,
        GestureKind::ThreeFingerRightSwipe,
        GestureKind::ThreeFingerUpSwipe,
        GestureKind::ThreeFingerDownSwipe,
    ];

    /// Label shown above the lock
    pub fn name(&self) -> String {
        self.to_string()
    }

    pub fn recognizer(&self) -> Recognizer {
        use GestureKind::*;
        use SwipeDirection::*;

        match self {
            DoubleTap => Recognizer::Tap { count: 2, touches: 1 },
            TripleTap => Recognizer::Tap { count: 3, touches: 1 },
            Rotate => Recognizer::Rotation,
            Pinch => Recognizer::Magnification,
            TwoFingerTap => Recognizer::Tap { count: 1, touches: 2 },
            ThreeFingerTap => Recognizer::Tap { count: 1, touches: 3 },
            LeftSwipe => swipe(Left, 1),
            RightSwipe => swipe(Right, 1),
            UpSwipe => swipe(Up, 1),
            DownSwipe => swipe(Down, 1),
            TwoFingerLeftSwipe => swipe(Left, 2),
            TwoFingerRightSwipe => swipe(Right, 2),
            TwoFingerUpSwipe => swipe(Up, 2),
            TwoFingerDownSwipe => swipe(Down, 2),
            ThreeFingerLeftSwipe => swipe(Left, 3),
            ThreeFingerRightSwipe => swipe(Right, 3),
            ThreeFingerUpSwipe => swipe(Up, 3),
            ThreeFingerDownSwipe => swipe(Down, 3),
            LongPress => Recognizer::LongPress {
                touches: 1,
                min_duration_secs: Some(0.4),
            },
            TwoFingerLongPress => Recognizer::LongPress {
                touches: 2,
                min_duration_secs: None,
            },
            ThreeFingerLongPress => Recognizer::LongPress {
                touches: 3,
                min_duration_secs: None,
            },
            LeftEdgePan => Recognizer::EdgePan { edge: Edge::Left },
            RightEdgePan => Recognizer::EdgePan { edge: Edge::Right },
        }
    }
}

fn swipe(direction: SwipeDirection, touches: u8) -> Recognizer {
    Recognizer::Swipe { direction, touches }
}

impl Distribution<GestureKind> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> GestureKind {
        GestureKind::ALL[rng.gen_range(0..GestureKind::ALL.len())]
    }
}

/// Draw the next gesture uniformly from the whole catalog.
///
/// Draws are independent, so the same gesture may come up twice in a row.
pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> GestureKind {
    rng.gen()
}
