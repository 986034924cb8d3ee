use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::engine::RoundConfig;

/// Persisted game settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub round_secs: f64,
    pub break_ms: u64,
    pub consonant_count: usize,
    pub player_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            round_secs: 5.0,
            break_ms: 1500,
            consonant_count: 2,
            player_name: "익명".to_string(),
        }
    }
}

impl Config {
    /// Round parameters with out-of-range values pulled back into bounds.
    pub fn round_config(&self) -> RoundConfig {
        RoundConfig {
            round_secs: if self.round_secs > 0.0 {
                self.round_secs
            } else {
                RoundConfig::default().round_secs
            },
            break_ms: self.break_ms,
            consonant_count: self.consonant_count.max(1),
        }
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        let rc = preset.round_config();
        self.round_secs = rc.round_secs;
        self.break_ms = rc.break_ms;
        self.consonant_count = rc.consonant_count;
    }
}

/// Difficulty presets matching the site's game settings panel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum Preset {
    /// 5 s rounds, two consonants.
    Standard,
    /// 3 s rounds, two consonants.
    Fast,
    /// 8 s rounds, two consonants.
    Relaxed,
    /// 5 s rounds, three consonants.
    Hard,
}

impl Preset {
    pub fn round_config(&self) -> RoundConfig {
        match self {
            Preset::Standard => RoundConfig {
                round_secs: 5.0,
                break_ms: 1500,
                consonant_count: 2,
            },
            Preset::Fast => RoundConfig {
                round_secs: 3.0,
                break_ms: 1000,
                consonant_count: 2,
            },
            Preset::Relaxed => RoundConfig {
                round_secs: 8.0,
                break_ms: 2000,
                consonant_count: 2,
            },
            Preset::Hard => RoundConfig {
                round_secs: 5.0,
                break_ms: 1500,
                consonant_count: 3,
            },
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
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
