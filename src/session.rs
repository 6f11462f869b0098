use chrono::{DateTime, Local};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{SessionClock, DEFAULT_COUNTDOWN_SECS};
use crate::gesture::{self, GestureKind};
use crate::lock::{LockImage, LockProgression, FRAMES_PER_LOCK};
use crate::record_store::{RecordKey, RecordStore};
use crate::score::{ScoreTracker, UpgradeThresholds};
use crate::util::round_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Mode {
    Speedrun,
    Countdown,
    /// Listed on the welcome screen but has no game logic yet
    #[strum(serialize = "Chess Clock")]
    ChessClock,
}

impl Mode {
    pub fn is_playable(&self) -> bool {
        !matches!(self, Mode::ChessClock)
    }
}

/// Which group the break animation is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TierDisplay {
    /// The group of the lock that was on screen, one behind when the
    /// clearing gesture just advanced the tier
    #[default]
    Lagged,
    /// Always the current group
    Current,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub speedrun_target: u32,
    pub countdown_secs: f64,
    /// Delay before the next lock appears
    pub animation_secs: f64,
    /// Length of the break clip itself
    pub clip_secs: f64,
    pub tier_display: TierDisplay,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            speedrun_target: 100,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            animation_secs: 0.5,
            clip_secs: 0.45,
            tier_display: TierDisplay::Lagged,
        }
    }
}

/// Everything the session loop reacts to, in arrival order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    SelectMode(Mode),
    GestureCompleted,
    AnimationFinished,
    Tick,
    ReturnToWelcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Welcome,
    AwaitingGesture,
    Animating,
    Finished,
}

impl Phase {
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::AwaitingGesture | Phase::Animating)
    }
}

/// The lock currently waiting for a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPrompt {
    pub gesture: GestureKind,
    pub image: LockImage,
}

/// A cleared lock breaking apart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub image: LockImage,
    pub started_at: f64,
}

impl Animation {
    /// Frame (1-based) to show at `now` for a clip of `clip_secs`
    pub fn frame_at(&self, now: f64, clip_secs: f64) -> u8 {
        if clip_secs <= 0.0 {
            return FRAMES_PER_LOCK;
        }
        let progress = ((now - self.started_at) / clip_secs).clamp(0.0, 1.0);
        let frame = (progress * FRAMES_PER_LOCK as f64).floor() as u8 + 1;
        frame.min(FRAMES_PER_LOCK)
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub mode: Mode,
    pub score: ScoreTracker,
    pub locks: LockProgression,
    pub thresholds: UpgradeThresholds,
    pub clock: SessionClock,
    pub gesture_done: bool,
    pub final_elapsed: Option<f64>,
    pub time_expired: bool,
    pub previous_best: f64,
    pub previous_best_set_at: Option<DateTime<Local>>,
    pub prompt: Option<LockPrompt>,
    pub animation: Option<Animation>,
}

impl SessionState {
    fn new(mode: Mode, clock: SessionClock) -> Self {
        Self {
            mode,
            score: ScoreTracker::new(),
            locks: LockProgression::new(),
            thresholds: UpgradeThresholds::for_mode(mode),
            clock,
            gesture_done: false,
            final_elapsed: None,
            time_expired: false,
            previous_best: 0.0,
            previous_best_set_at: None,
            prompt: None,
            animation: None,
        }
    }

    pub fn started_at(&self) -> f64 {
        self.clock.started_at()
    }
}

/// Final result of a session, for the finished screen
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub mode: Mode,
    pub score: u32,
    /// Speedrun completion time in seconds, millisecond precision
    pub final_elapsed: Option<f64>,
    pub previous_best: f64,
    pub previous_best_set_at: Option<DateTime<Local>>,
    pub new_best: bool,
    /// Set when the new best could not be stored
    pub persist_error: Option<String>,
}

impl SessionOutcome {
    /// How much the previous best was beaten by, if it was
    pub fn improvement(&self) -> Option<f64> {
        if !self.new_best || self.previous_best == 0.0 {
            return None;
        }
        match self.mode {
            Mode::Speedrun => self.final_elapsed.map(|t| self.previous_best - t),
            Mode::Countdown => Some(self.score as f64 - self.previous_best),
            Mode::ChessClock => None,
        }
    }
}

/// Welcome -> active -> finished state machine for one player
pub struct GameSession<S: RecordStore, R: Rng> {
    config: SessionConfig,
    store: S,
    rng: R,
    phase: Phase,
    state: Option<SessionState>,
    outcome: Option<SessionOutcome>,
}

impl<S: RecordStore, R: Rng> GameSession<S, R> {
    pub fn new(config: SessionConfig, store: S, rng: R) -> Self {
        Self {
            config,
            store,
            rng,
            phase: Phase::Welcome,
            state: None,
            outcome: None,
        }
    }

    /// Apply one event. Returns true if anything changed.
    pub fn handle(&mut self, event: GameEvent, now: f64) -> bool {
        match event {
            GameEvent::SelectMode(mode) => self.select_mode(mode, now),
            GameEvent::GestureCompleted => self.gesture_completed(now),
            GameEvent::AnimationFinished => self.animation_finished(now),
            GameEvent::Tick => self.tick(now),
            GameEvent::ReturnToWelcome => self.return_to_welcome(),
        }
    }

    /// Start a fresh session in `mode`, discarding any previous one
    pub fn select_mode(&mut self, mode: Mode, now: f64) -> bool {
        let Some(key) = RecordKey::for_mode(mode) else {
            info!(%mode, "mode not available yet");
            return false;
        };

        let clock = match mode {
            Mode::Countdown => SessionClock::countdown(now, self.config.countdown_secs),
            _ => SessionClock::elapsed(now),
        };
        let mut state = SessionState::new(mode, clock);

        state.previous_best = self.store.get(key).unwrap_or_else(|e| {
            warn!(error = %e, key = key.as_str(), "could not read best record, treating as none");
            0.0
        });
        state.previous_best_set_at = self.store.last_updated(key).unwrap_or_else(|e| {
            warn!(error = %e, key = key.as_str(), "could not read record timestamp");
            None
        });

        info!(
            %mode,
            started_at = now,
            previous_best = state.previous_best,
            "session started"
        );

        self.state = Some(state);
        self.outcome = None;
        self.phase = Phase::AwaitingGesture;
        self.present_next_lock();
        true
    }

    /// The player performed the requested gesture
    pub fn gesture_completed(&mut self, now: f64) -> bool {
        if self.phase != Phase::AwaitingGesture {
            debug!(phase = ?self.phase, "gesture ignored");
            return false;
        }
        // a countdown that ran out before this gesture arrived wins
        if self.advance_clock(now) {
            return true;
        }
        let Some(state) = self.state.as_mut() else {
            return false;
        };

        state.prompt = None;
        state.score.record_success();
        let score = state.score.score();
        state.locks.maybe_advance_tier(score, &state.thresholds);
        state.gesture_done = true;

        let image = match self.config.tier_display {
            TierDisplay::Lagged => LockImage::new(
                state.locks.display_tier(score, &state.thresholds),
                state.locks.current_image_index(),
            ),
            TierDisplay::Current => state.locks.current_image(),
        };
        state.animation = Some(Animation {
            image,
            started_at: now,
        });
        self.phase = Phase::Animating;
        debug!(score, tier = state.locks.current_tier(), "lock cleared");

        if state.mode == Mode::Speedrun && score >= self.config.speedrun_target {
            self.finish_speedrun(now);
        }
        true
    }

    /// The break clip ended; roll the next lock, or show the result if the
    /// run was already decided
    pub fn animation_finished(&mut self, _now: f64) -> bool {
        if self.phase != Phase::Animating {
            return false;
        }
        if self.outcome.is_some() {
            self.enter_finished();
            return true;
        }
        let Some(state) = self.state.as_mut() else {
            return false;
        };

        state.locks.reroll_image_index(&mut self.rng);
        state.gesture_done = false;
        state.animation = None;
        self.phase = Phase::AwaitingGesture;
        self.present_next_lock();
        true
    }

    /// Advance timers: countdown expiry first, then the animation delay
    pub fn tick(&mut self, now: f64) -> bool {
        if !self.phase.is_active() {
            return false;
        }
        if self.advance_clock(now) {
            return true;
        }

        let animation_due = self.phase == Phase::Animating
            && self
                .animation()
                .is_some_and(|a| now - a.started_at >= self.config.animation_secs);
        if animation_due {
            self.animation_finished(now)
        } else {
            false
        }
    }

    /// Drop the session and go back to mode selection
    pub fn return_to_welcome(&mut self) -> bool {
        if self.phase == Phase::Welcome {
            return false;
        }
        info!("returned to welcome");
        self.state = None;
        self.outcome = None;
        self.phase = Phase::Welcome;
        true
    }

    /// Returns true if the countdown expired on this call
    fn advance_clock(&mut self, now: f64) -> bool {
        let expired = self
            .state
            .as_mut()
            .is_some_and(|state| state.clock.tick(now));
        if expired {
            self.finish_countdown();
        }
        expired
    }

    fn present_next_lock(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let gesture = gesture::pick(&mut self.rng);
        let image = state.locks.current_image();
        debug!(gesture = %gesture, image = %image, "next lock");
        state.prompt = Some(LockPrompt { gesture, image });
    }

    fn finish_speedrun(&mut self, now: f64) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let elapsed = round_millis(state.clock.elapsed_since(now));
        state.final_elapsed = Some(elapsed);
        let new_best = elapsed < state.previous_best || state.previous_best == 0.0;
        info!(elapsed, previous_best = state.previous_best, new_best, "speedrun finished");

        // the last break clip still plays; animation_finished shows the result
        self.finish(RecordKey::HundredGesturesTime, new_best, elapsed);
    }

    fn finish_countdown(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.time_expired = true;
        let score = state.score.score();
        let new_best = score as f64 > state.previous_best;
        info!(score, previous_best = state.previous_best, new_best, "countdown expired");

        self.finish(RecordKey::OneMinuteScore, new_best, score as f64);
        self.enter_finished();
    }

    /// Persist a new best and freeze the result
    fn finish(&mut self, key: RecordKey, new_best: bool, value: f64) {
        let persist_error = if new_best {
            self.store.set(key, value).err().map(|e| {
                warn!(error = %e, key = key.as_str(), value, "could not store new best");
                e.to_string()
            })
        } else {
            None
        };

        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.prompt = None;
        self.outcome = Some(SessionOutcome {
            mode: state.mode,
            score: state.score.score(),
            final_elapsed: state.final_elapsed,
            previous_best: state.previous_best,
            previous_best_set_at: state.previous_best_set_at,
            new_best,
            persist_error,
        });
    }

    fn enter_finished(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.prompt = None;
            state.animation = None;
        }
        self.phase = Phase::Finished;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn prompt(&self) -> Option<&LockPrompt> {
        self.state.as_ref().and_then(|s| s.prompt.as_ref())
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.state.as_ref().and_then(|s| s.animation.as_ref())
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.score.score())
    }

    pub fn remaining(&self) -> Option<f64> {
        self.state.as_ref().and_then(|s| s.clock.remaining())
    }

    pub fn elapsed(&self, now: f64) -> Option<f64> {
        self.state.as_ref().map(|s| s.clock.elapsed_since(now))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_store::MemoryRecordStore;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session(store: MemoryRecordStore) -> GameSession<MemoryRecordStore, StdRng> {
        GameSession::new(SessionConfig::default(), store, StdRng::seed_from_u64(11))
    }

    /// Clear one lock and let its animation run out
    fn clear_lock(s: &mut GameSession<MemoryRecordStore, StdRng>, now: f64) {
        assert!(s.gesture_completed(now));
        if s.phase() == Phase::Animating {
            assert!(s.animation_finished(now));
        }
    }

    #[test]
    fn test_starts_at_welcome() {
        let s = session(MemoryRecordStore::new());
        assert_eq!(s.phase(), Phase::Welcome);
        assert!(s.state().is_none());
        assert!(s.prompt().is_none());
    }

    #[test]
    fn test_select_mode_enters_active() {
        let mut s = session(MemoryRecordStore::new());
        assert!(s.handle(GameEvent::SelectMode(Mode::Speedrun), 3.0));

        assert_eq!(s.phase(), Phase::AwaitingGesture);
        let state = s.state().unwrap();
        assert_eq!(state.started_at(), 3.0);
        assert_eq!(state.thresholds.as_slice(), &[20, 40, 60, 80]);
        assert_eq!(state.score.score(), 0);
        assert_eq!(state.locks.current_tier(), 1);
        assert!(s.prompt().is_some());
    }

    #[test]
    fn test_chess_clock_is_inert() {
        let mut s = session(MemoryRecordStore::new());
        assert!(!s.select_mode(Mode::ChessClock, 0.0));
        assert_eq!(s.phase(), Phase::Welcome);
        assert!(!Mode::ChessClock.is_playable());
    }

    #[test]
    fn test_loads_previous_best() {
        let store = MemoryRecordStore::new().with_record(RecordKey::OneMinuteScore, 17.0);
        let mut s = session(store);
        s.select_mode(Mode::Countdown, 0.0);
        assert_eq!(s.state().unwrap().previous_best, 17.0);
        assert!(s.state().unwrap().previous_best_set_at.is_some());
    }

    #[test]
    fn test_read_failure_means_no_record() {
        let mut store = MemoryRecordStore::new().with_record(RecordKey::OneMinuteScore, 17.0);
        store.fail_reads = true;
        let mut s = session(store);
        assert!(s.select_mode(Mode::Countdown, 0.0));
        assert_eq!(s.state().unwrap().previous_best, 0.0);
    }

    #[test]
    fn test_speedrun_score_and_tier_follow_gestures() {
        let mut s = session(MemoryRecordStore::new());
        s.select_mode(Mode::Speedrun, 0.0);
        let thresholds = UpgradeThresholds::for_mode(Mode::Speedrun);

        for n in 1..=99u32 {
            clear_lock(&mut s, n as f64 * 0.1);
            let state = s.state().unwrap();
            assert_eq!(state.score.score(), n);
            assert_eq!(
                state.locks.current_tier() as usize,
                1 + thresholds.reached(n)
            );
        }
        assert_eq!(s.phase(), Phase::AwaitingGesture);
    }

    #[test]
    fn test_gestures_ignored_while_animating() {
        let mut s = session(MemoryRecordStore::new());
        s.select_mode(Mode::Countdown, 0.0);

        assert!(s.gesture_completed(1.0));
        assert_eq!(s.phase(), Phase::Animating);
        assert!(s.prompt().is_none());
        assert!(!s.gesture_completed(1.1));
        assert_eq!(s.score(), 1);
    }

    #[test]
    fn test_tick_ends_animation_after_delay() {
        let mut s = session(MemoryRecordStore::new());
        s.select_mode(Mode::Countdown, 0.0);
        s.gesture_completed(1.0);

        assert!(!s.tick(1.2));
        assert_eq!(s.phase(), Phase::Animating);
        assert!(s.tick(1.5));
        assert_eq!(s.phase(), Phase::AwaitingGesture);
        let state = s.state().unwrap();
        assert!(!state.gesture_done);
        assert!((1..=5).contains(&state.locks.current_image_index()));
    }

    #[test]
    fn test_animation_uses_image_on_screen_at_threshold() {
        let mut s = session(MemoryRecordStore::new());
        s.select_mode(Mode::Countdown, 0.0);
        for n in 1..=8 {
            clear_lock(&mut s, n as f64);
        }
        let shown = s.prompt().unwrap().image;
        assert_eq!(shown.group, 1);

        s.gesture_completed(9.0);
        let state = s.state().unwrap();
        assert_eq!(state.locks.current_tier(), 2);
        let animation = s.animation().unwrap();
        assert_eq!(animation.image, shown);
        assert_eq!(
            animation.image.group,
            state.locks.display_tier(9, &state.thresholds)
        );
    }

    #[test]
    fn test_current_tier_display() {
        let config = SessionConfig {
            tier_display: TierDisplay::Current,
            ..SessionConfig::default()
        };
        let mut s = GameSession::new(config, MemoryRecordStore::new(), StdRng::seed_from_u64(1));
        s.select_mode(Mode::Countdown, 0.0);
        for n in 1..=8 {
            clear_lock(&mut s, n as f64);
        }
        assert_eq!(s.prompt().unwrap().image.group, 1);

        s.gesture_completed(9.0);
        assert_eq!(s.animation().unwrap().image.group, 2);
    }

    #[test]
    fn test_speedrun_new_best_when_no_record() {
        let mut s = session(MemoryRecordStore::new());
        s.select_mode(Mode::Speedrun, 100.0);
        for n in 1..100 {
            clear_lock(&mut s, 100.0 + n as f64 * 0.1);
        }
        assert!(s.gesture_completed(112.345));

        // the record is decided at the gesture, the last clip still plays
        assert_eq!(s.phase(), Phase::Animating);
        assert!(s.animation().is_some());
        assert_eq!(
            s.store().writes(),
            &[(RecordKey::HundredGesturesTime, 12.345)]
        );
        assert!(s.tick(112.845));
        assert_eq!(s.phase(), Phase::Finished);
        assert!(s.animation().is_none());
        let outcome = s.outcome().unwrap();
        assert_eq!(outcome.final_elapsed, Some(12.345));
        assert!(outcome.new_best);
        assert_eq!(outcome.improvement(), None);
    }

    #[test]
    fn test_speedrun_slower_time_not_stored() {
        let store = MemoryRecordStore::new().with_record(RecordKey::HundredGesturesTime, 10.0);
        let mut s = session(store);
        s.select_mode(Mode::Speedrun, 0.0);
        for n in 1..100 {
            clear_lock(&mut s, n as f64 * 0.1);
        }
        s.gesture_completed(12.345);
        s.animation_finished(12.845);

        assert_eq!(s.phase(), Phase::Finished);
        assert!(s.store().writes().is_empty());
        assert!(!s.outcome().unwrap().new_best);
    }

    #[test]
    fn test_speedrun_faster_time_reports_improvement() {
        let store = MemoryRecordStore::new().with_record(RecordKey::HundredGesturesTime, 15.0);
        let config = SessionConfig {
            speedrun_target: 5,
            ..SessionConfig::default()
        };
        let mut s = GameSession::new(config, store, StdRng::seed_from_u64(2));
        s.select_mode(Mode::Speedrun, 0.0);
        for n in 1..5 {
            clear_lock(&mut s, n as f64);
        }
        s.gesture_completed(12.5);

        let outcome = s.outcome().unwrap();
        assert!(outcome.new_best);
        assert_eq!(outcome.score, 5);
        assert!((outcome.improvement().unwrap() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_speedrun_last_clip_plays_before_result() {
        let config = SessionConfig {
            speedrun_target: 3,
            ..SessionConfig::default()
        };
        let mut s = GameSession::new(config, MemoryRecordStore::new(), StdRng::seed_from_u64(4));
        s.select_mode(Mode::Speedrun, 0.0);
        clear_lock(&mut s, 1.0);
        clear_lock(&mut s, 2.0);
        let shown = s.prompt().unwrap().image;
        s.gesture_completed(3.0);

        assert_eq!(s.phase(), Phase::Animating);
        assert_eq!(s.animation().unwrap().image, shown);
        assert_eq!(s.outcome().unwrap().final_elapsed, Some(3.0));
        assert!(s.prompt().is_none());

        // nothing more to score while the clip plays
        assert!(!s.gesture_completed(3.1));
        assert!(!s.tick(3.2));
        assert_eq!(s.phase(), Phase::Animating);

        assert!(s.tick(3.5));
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.score(), 3);
        assert!(s.prompt().is_none());
        assert_eq!(s.outcome().unwrap().final_elapsed, Some(3.0));
    }

    #[test]
    fn test_countdown_tie_is_not_a_record() {
        let store = MemoryRecordStore::new().with_record(RecordKey::OneMinuteScore, 5.0);
        let mut s = session(store);
        s.select_mode(Mode::Countdown, 0.0);
        for n in 1..=5 {
            clear_lock(&mut s, n as f64);
        }
        assert!(s.tick(60.0));

        assert_eq!(s.phase(), Phase::Finished);
        assert!(s.state().unwrap().time_expired);
        assert!(s.store().writes().is_empty());
    }

    #[test]
    fn test_countdown_better_score_is_stored() {
        let store = MemoryRecordStore::new().with_record(RecordKey::OneMinuteScore, 5.0);
        let mut s = session(store);
        s.select_mode(Mode::Countdown, 0.0);
        for n in 1..=6 {
            clear_lock(&mut s, n as f64);
        }
        s.tick(60.5);

        assert_eq!(s.store().writes(), &[(RecordKey::OneMinuteScore, 6.0)]);
        let outcome = s.outcome().unwrap();
        assert!(outcome.new_best);
        assert_eq!(outcome.improvement(), Some(1.0));
    }

    #[test]
    fn test_countdown_expires_mid_animation() {
        let mut s = session(MemoryRecordStore::new());
        s.select_mode(Mode::Countdown, 0.0);
        s.gesture_completed(59.8);
        assert_eq!(s.phase(), Phase::Animating);

        assert!(s.tick(60.01));
        assert_eq!(s.phase(), Phase::Finished);
        assert!(s.animation().is_none());
    }

    #[test]
    fn test_no_score_after_expiry() {
        let mut s = session(MemoryRecordStore::new());
        s.select_mode(Mode::Countdown, 0.0);
        clear_lock(&mut s, 1.0);
        s.tick(60.0);

        assert!(!s.gesture_completed(60.0));
        assert!(!s.handle(GameEvent::GestureCompleted, 60.001));
        assert_eq!(s.score(), 1);
        assert_eq!(s.outcome().unwrap().score, 1);
    }

    #[test]
    fn test_late_gesture_loses_to_expiry() {
        let mut s = session(MemoryRecordStore::new());
        s.select_mode(Mode::Countdown, 0.0);
        clear_lock(&mut s, 1.0);

        // no tick was delivered before the deadline passed
        assert!(s.gesture_completed(60.2));
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.score(), 1);
    }

    #[test]
    fn test_write_failure_still_finishes() {
        let mut store = MemoryRecordStore::new();
        store.fail_writes = true;
        let mut s = session(store);
        s.select_mode(Mode::Countdown, 0.0);
        clear_lock(&mut s, 1.0);
        s.tick(61.0);

        assert_eq!(s.phase(), Phase::Finished);
        let outcome = s.outcome().unwrap();
        assert!(outcome.new_best);
        assert_matches!(outcome.persist_error, Some(_));
    }

    #[test]
    fn test_finished_is_terminal() {
        let mut s = session(MemoryRecordStore::new());
        s.select_mode(Mode::Countdown, 0.0);
        s.tick(60.0);
        let outcome = s.outcome().cloned();

        assert!(!s.tick(70.0));
        assert!(!s.animation_finished(70.0));
        assert!(!s.gesture_completed(70.0));
        assert_eq!(s.outcome().cloned(), outcome);
    }

    #[test]
    fn test_reselecting_mode_resets_everything() {
        let mut s = session(MemoryRecordStore::new());
        s.select_mode(Mode::Speedrun, 0.0);
        for n in 1..=25 {
            clear_lock(&mut s, n as f64);
        }
        assert_eq!(s.state().unwrap().locks.current_tier(), 2);

        s.select_mode(Mode::Speedrun, 50.0);
        let state = s.state().unwrap();
        assert_eq!(state.score.score(), 0);
        assert_eq!(state.locks.current_tier(), 1);
        assert_eq!(state.locks.current_image_index(), 1);
        assert_eq!(state.started_at(), 50.0);
        assert_eq!(state.final_elapsed, None);
        assert!(!state.time_expired);
        assert!(!state.gesture_done);
        assert_eq!(s.phase(), Phase::AwaitingGesture);
    }

    #[test]
    fn test_return_to_welcome() {
        let mut s = session(MemoryRecordStore::new());
        s.select_mode(Mode::Countdown, 0.0);
        s.tick(60.0);

        assert!(s.handle(GameEvent::ReturnToWelcome, 61.0));
        assert_eq!(s.phase(), Phase::Welcome);
        assert!(s.state().is_none());
        assert!(s.outcome().is_none());
        assert!(!s.return_to_welcome());
    }

    #[test]
    fn test_animation_frames() {
        let animation = Animation {
            image: LockImage::new(1, 1),
            started_at: 10.0,
        };
        assert_eq!(animation.frame_at(10.0, 0.45), 1);
        assert_eq!(animation.frame_at(10.45, 0.45), 13);
        assert_eq!(animation.frame_at(11.0, 0.45), 13);
        let mid = animation.frame_at(10.2, 0.45);
        assert!(mid > 1 && mid < 13);
    }
}
