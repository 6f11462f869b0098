use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::gesture::{Edge, GestureKind, Recognizer, SwipeDirection};

/// A key plus the modifiers that must be held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyChord {
    fn plain(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::NONE,
        }
    }

    fn arrow(direction: SwipeDirection, touches: u8) -> Self {
        let code = match direction {
            SwipeDirection::Left => KeyCode::Left,
            SwipeDirection::Right => KeyCode::Right,
            SwipeDirection::Up => KeyCode::Up,
            SwipeDirection::Down => KeyCode::Down,
        };
        let modifiers = match touches {
            1 => KeyModifiers::NONE,
            2 => KeyModifiers::SHIFT,
            _ => KeyModifiers::ALT,
        };
        Self { code, modifiers }
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        match self.code {
            // terminals disagree on whether shifted chars carry SHIFT
            KeyCode::Char(_) => key.code == self.code,
            _ => {
                let held = key.modifiers & (KeyModifiers::SHIFT | KeyModifiers::ALT);
                key.code == self.code && held == self.modifiers
            }
        }
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            write!(f, "Shift+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            write!(f, "Alt+")?;
        }
        match self.code {
            KeyCode::Left => write!(f, "←"),
            KeyCode::Right => write!(f, "→"),
            KeyCode::Up => write!(f, "↑"),
            KeyCode::Down => write!(f, "↓"),
            KeyCode::Char(c) => write!(f, "{c}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Keyboard stand-in for the touch recognizers: each gesture is "performed"
/// by pressing the chord derived from its recognizer configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keymap;

impl Keymap {
    pub fn chord_for(&self, kind: GestureKind) -> KeyChord {
        match kind.recognizer() {
            Recognizer::Tap { touches: 1, count } => KeyChord::plain(if count >= 3 { 't' } else { 'd' }),
            Recognizer::Tap { touches, .. } => KeyChord::plain(if touches >= 3 { '3' } else { '2' }),
            Recognizer::Rotation => KeyChord::plain('r'),
            Recognizer::Magnification => KeyChord::plain('p'),
            Recognizer::Swipe { direction, touches } => KeyChord::arrow(direction, touches),
            Recognizer::LongPress { touches, .. } => KeyChord::plain(match touches {
                1 => 'l',
                2 => 'k',
                _ => 'j',
            }),
            Recognizer::EdgePan { edge: Edge::Left } => KeyChord::plain('['),
            Recognizer::EdgePan { edge: Edge::Right } => KeyChord::plain(']'),
        }
    }

    pub fn matches(&self, kind: GestureKind, key: &KeyEvent) -> bool {
        self.chord_for(kind).matches(key)
    }

    pub fn gesture_for(&self, key: &KeyEvent) -> Option<GestureKind> {
        GestureKind::ALL
            .into_iter()
            .find(|&kind| self.matches(kind, key))
    }
}
