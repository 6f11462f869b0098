use crate::session::Mode;

/// Score values at which the lock group advances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeThresholds(Vec<u32>);

impl UpgradeThresholds {
    pub const SPEEDRUN: [u32; 4] = [20, 40, 60, 80];
    pub const COUNTDOWN: [u32; 5] = [9, 18, 27, 36, 45];

    pub fn new(values: impl Into<Vec<u32>>) -> Self {
        Self(values.into())
    }

    /// Fixed thresholds for a mode. Chess clock has none.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Speedrun => Self::new(Self::SPEEDRUN),
            Mode::Countdown => Self::new(Self::COUNTDOWN),
            Mode::ChessClock => Self::new(Vec::new()),
        }
    }

    pub fn contains(&self, score: u32) -> bool {
        self.0.contains(&score)
    }

    /// Number of thresholds at or below `score`
    pub fn reached(&self, score: u32) -> usize {
        self.0.iter().filter(|&&t| t <= score).count()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreTracker {
    score: u32,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.score += 1;
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// True when the current score sits exactly on an upgrade threshold
    pub fn on_threshold(&self, thresholds: &UpgradeThresholds) -> bool {
        thresholds.contains(self.score)
    }
}
