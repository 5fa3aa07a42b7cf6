//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tb_core::analytics::AnalyticsConfig;
use tb_core::{
    Calendar, CreationPolicy, DaySegment, MaxBlocksPerDay, Planner, SlotOptions, Unlimited,
    default_segments,
};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Parts of the day searched by `tb suggest`.
    #[serde(default = "default_segments")]
    pub segments: Vec<DaySegment>,

    /// Slot search tuning.
    #[serde(default)]
    pub slots: SlotOptions,

    /// Report windows and insight thresholds.
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Optional cap on blocks per day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_blocks_per_day: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("tb.db"),
            segments: default_segments(),
            slots: SlotOptions::default(),
            analytics: AnalyticsConfig::default(),
            max_blocks_per_day: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, `~/.config/tb/config.toml`, the given
    /// file, then `TB_*` environment variables (`__` separates nested keys,
    /// e.g. `TB_ANALYTICS__TOP_HOURS=5`).
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TB_*)
        figment = figment.merge(Env::prefixed("TB_").split("__"));

        figment.extract()
    }

    /// The creation policy selected by `max_blocks_per_day`.
    pub fn policy(&self) -> Box<dyn CreationPolicy> {
        match self.max_blocks_per_day {
            Some(limit) => Box::new(MaxBlocksPerDay(limit)),
            None => Box::new(Unlimited),
        }
    }

    pub fn planner(&self, calendar: Calendar) -> Planner<Box<dyn CreationPolicy>> {
        Planner::with_policy(calendar, self.policy())
    }
}

/// Returns the platform-specific config directory for tb.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tb"))
}

/// Returns the platform-specific data directory for tb.
///
/// On Linux: `~/.local/share/tb`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tb"))
}
