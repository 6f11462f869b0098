use crossterm::event::{KeyCode, KeyEvent};
use rand::Rng;
use tracing::debug;

use crate::keymap::Keymap;
use crate::record_store::RecordStore;
use crate::runtime::{InputEvent, Stamped};
use crate::session::{GameEvent, GameSession, Mode, Phase};

/// What the terminal loop should do after an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Redraw,
    Quit,
}

/// Translates terminal input into session events
pub struct App<S: RecordStore, R: Rng> {
    pub session: GameSession<S, R>,
    pub keymap: Keymap,
    /// Last mode started, for "retry"
    pub last_mode: Option<Mode>,
    /// One-line message for the welcome screen
    pub notice: Option<String>,
    /// Clock reading of the latest input
    pub now: f64,
}

impl<S: RecordStore, R: Rng> App<S, R> {
    pub fn new(session: GameSession<S, R>) -> Self {
        Self {
            session,
            keymap: Keymap,
            last_mode: None,
            notice: None,
            now: 0.0,
        }
    }

    pub fn on_input(&mut self, input: Stamped) -> Control {
        self.now = input.at;

        // every input carries a clock reading, so timers advance even when
        // keys arrive faster than the tick interval
        let was_active = self.session.phase().is_active();
        let timers_changed = self.session.tick(input.at);
        let still_active = self.session.phase().is_active();

        match input.event {
            InputEvent::Tick => {
                if timers_changed || still_active {
                    Control::Redraw
                } else {
                    Control::Continue
                }
            }
            InputEvent::Resize => Control::Redraw,
            InputEvent::Key(key) if key.code == KeyCode::Esc => Control::Quit,
            // the session ended before this key arrived; it belongs to nothing
            InputEvent::Key(_) if was_active && !still_active => Control::Redraw,
            InputEvent::Key(key) => match self.on_key(key, input.at) {
                Control::Continue if timers_changed => Control::Redraw,
                control => control,
            },
        }
    }

    fn on_key(&mut self, key: KeyEvent, now: f64) -> Control {
        let event = match self.session.phase() {
            Phase::Welcome => match key.code {
                KeyCode::Char('1') => Some(GameEvent::SelectMode(Mode::Speedrun)),
                KeyCode::Char('2') => Some(GameEvent::SelectMode(Mode::Countdown)),
                KeyCode::Char('3') => Some(GameEvent::SelectMode(Mode::ChessClock)),
                KeyCode::Char('q') => return Control::Quit,
                _ => None,
            },
            Phase::AwaitingGesture => match key.code {
                KeyCode::Backspace => Some(GameEvent::ReturnToWelcome),
                _ => self
                    .session
                    .prompt()
                    .filter(|prompt| self.keymap.matches(prompt.gesture, &key))
                    .map(|_| GameEvent::GestureCompleted),
            },
            Phase::Animating => match key.code {
                KeyCode::Backspace => Some(GameEvent::ReturnToWelcome),
                _ => None,
            },
            Phase::Finished => match key.code {
                KeyCode::Char('r') => self.last_mode.map(GameEvent::SelectMode),
                KeyCode::Char('b') | KeyCode::Backspace => Some(GameEvent::ReturnToWelcome),
                KeyCode::Char('q') => return Control::Quit,
                _ => None,
            },
        };

        match event {
            Some(event) => self.apply(event, now),
            None => Control::Continue,
        }
    }

    fn apply(&mut self, event: GameEvent, now: f64) -> Control {
        debug!(?event, now, "applying");
        if let GameEvent::SelectMode(mode) = event {
            if mode.is_playable() {
                self.last_mode = Some(mode);
                self.notice = None;
            } else {
                self.notice = Some(format!("{mode} mode is coming soon"));
            }
        }

        if self.session.handle(event, now) || self.notice.is_some() {
            Control::Redraw
        } else {
            Control::Continue
        }
    }
}
