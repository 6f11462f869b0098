use std::cell::Cell;
use std::time::Instant;

/// Source of "now" in seconds
pub trait Clock {
    fn now(&self) -> f64;
}

/// Production clock backed by `Instant`, counting from construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock for tests and replays
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: f64) {
        self.now.set(now);
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

pub const DEFAULT_COUNTDOWN_SECS: f64 = 60.0;

/// Session timing, chosen by mode
#[derive(Debug, Clone, PartialEq)]
pub enum SessionClock {
    /// Speedrun: time since start, never paused
    Elapsed { started_at: f64 },
    /// Countdown: fixed budget ticking down to zero
    Countdown {
        started_at: f64,
        duration: f64,
        remaining: f64,
        expiry_fired: bool,
    },
}

impl SessionClock {
    pub fn elapsed(now: f64) -> Self {
        SessionClock::Elapsed { started_at: now }
    }

    pub fn countdown(now: f64, duration: f64) -> Self {
        SessionClock::Countdown {
            started_at: now,
            duration,
            remaining: duration.max(0.0),
            expiry_fired: false,
        }
    }

    pub fn started_at(&self) -> f64 {
        match *self {
            SessionClock::Elapsed { started_at } | SessionClock::Countdown { started_at, .. } => {
                started_at
            }
        }
    }

    pub fn elapsed_since(&self, now: f64) -> f64 {
        (now - self.started_at()).max(0.0)
    }

    /// Seconds left on a countdown; `None` for an elapsed clock
    pub fn remaining(&self) -> Option<f64> {
        match *self {
            SessionClock::Elapsed { .. } => None,
            SessionClock::Countdown { remaining, .. } => Some(remaining),
        }
    }

    pub fn expired(&self) -> bool {
        matches!(*self, SessionClock::Countdown { remaining, .. } if remaining <= 0.0)
    }

    /// Bring the countdown up to `now`. Returns true exactly once, on the
    /// tick where the budget runs out.
    pub fn tick(&mut self, now: f64) -> bool {
        match self {
            SessionClock::Elapsed { .. } => false,
            SessionClock::Countdown {
                started_at,
                duration,
                remaining,
                expiry_fired,
            } => {
                *remaining = (*duration - (now - *started_at)).max(0.0);
                if *remaining <= 0.0 && !*expiry_fired {
                    *expiry_fired = true;
                    true
                } else {
                    false
                }
            }
        }
    }
}
