use std::fmt;

use rand::Rng;
use tracing::debug;

use crate::score::UpgradeThresholds;

/// Number of lock images available in each group
pub const LOCKS_PER_GROUP: u8 = 5;
/// Frames in one lock's break animation
pub const FRAMES_PER_LOCK: u8 = 13;

/// Reference to one lock image set, rendered as `G{group}L{lock}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockImage {
    pub group: u32,
    pub lock: u8,
}

impl LockImage {
    pub fn new(group: u32, lock: u8) -> Self {
        Self { group, lock }
    }

    /// Asset name of frame `n` (1-based). Frame 1 is the still image.
    pub fn frame_name(&self, n: u8) -> String {
        format!("{self}F{n}")
    }

    pub fn frame_names(&self) -> Vec<String> {
        (1..=FRAMES_PER_LOCK).map(|n| self.frame_name(n)).collect()
    }
}

impl fmt::Display for LockImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}L{}", self.group, self.lock)
    }
}

/// Which lock image is up next and which difficulty group it comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockProgression {
    image_index: u8,
    tier: u32,
}

impl Default for LockProgression {
    fn default() -> Self {
        Self {
            image_index: 1,
            tier: 1,
        }
    }
}

impl LockProgression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_image_index(&self) -> u8 {
        self.image_index
    }

    pub fn reroll_image_index<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.image_index = rng.gen_range(1..=LOCKS_PER_GROUP);
    }

    pub fn current_tier(&self) -> u32 {
        self.tier
    }

    /// Advance one tier when `score` is exactly one of the thresholds.
    /// Returns whether the tier moved.
    pub fn maybe_advance_tier(&mut self, score: u32, thresholds: &UpgradeThresholds) -> bool {
        if thresholds.contains(score) {
            self.tier += 1;
            debug!(tier = self.tier, score, "lock group advanced");
            true
        } else {
            false
        }
    }

    /// Group to render while a break animation plays. At the exact score
    /// that advanced the tier this is still the previous group.
    pub fn display_tier(&self, score: u32, thresholds: &UpgradeThresholds) -> u32 {
        if thresholds.contains(score) {
            self.tier.saturating_sub(1).max(1)
        } else {
            self.tier
        }
    }

    pub fn current_image(&self) -> LockImage {
        LockImage::new(self.tier, self.image_index)
    }
}
