use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::clock::DEFAULT_COUNTDOWN_SECS;
use crate::session::{SessionConfig, TierDisplay};

/// Persisted game settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Locks to clear in speedrun mode
    pub speedrun_target: u32,
    /// Time budget in countdown mode
    pub countdown_secs: f64,
    /// Pause after a cleared lock before the next one appears
    pub animation_ms: u64,
    /// Length of the break clip
    pub clip_ms: u64,
    pub tick_ms: u64,
    pub tier_display: TierDisplay,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speedrun_target: 100,
            countdown_secs: 60.0,
            animation_ms: 500,
            clip_ms: 450,
            tick_ms: 10,
            tier_display: TierDisplay::Lagged,
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            speedrun_target: cfg.speedrun_target.max(1),
            countdown_secs: if cfg.countdown_secs.is_finite() && cfg.countdown_secs > 0.0 {
                cfg.countdown_secs
            } else {
                DEFAULT_COUNTDOWN_SECS
            },
            animation_secs: cfg.animation_ms as f64 / 1000.0,
            clip_secs: cfg.clip_ms as f64 / 1000.0,
            tier_display: cfg.tier_display,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "lockbuster") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("lockbuster_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
