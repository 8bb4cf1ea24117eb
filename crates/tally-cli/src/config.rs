//! Configuration loading and management.

use std::path::{Path, PathBuf};

use anyhow::{Result, ensure};
use chrono::NaiveDate;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tally_core::{DayBoundary, SliceConfig};

/// Longest accepted break threshold, one week.
pub const MAX_BREAK_MINUTES: i64 = 7 * 24 * 60;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the daily `YYYY-MM-DD.<ext>` event logs.
    pub log_dir: PathBuf,

    /// Extension of the daily log files, without the dot.
    pub file_extension: String,

    /// Gaps of this many minutes or more count as a break.
    /// Must be between 1 and [`MAX_BREAK_MINUTES`].
    pub break_threshold_minutes: i64,

    /// Calendar used to assign slices to days.
    pub day_boundary: DayBoundary,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            log_dir: data_dir.join("logs"),
            file_extension: "jsonl".to_string(),
            break_threshold_minutes: 30,
            day_boundary: DayBoundary::Local,
        }
    }
}

impl Config {
    /// Loads configuration from default locations, optionally layering a
    /// specific file on top.
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

        // Load from environment variables (TALLY_*)
        figment = figment.merge(Env::prefixed("TALLY_"));

        figment.extract()
    }

    /// Slicing parameters, with an optional per-run threshold override.
    ///
    /// Fails when the effective threshold is outside
    /// `1..=MAX_BREAK_MINUTES`.
    pub fn slice_config(&self, break_minutes: Option<i64>) -> Result<SliceConfig> {
        let minutes = break_minutes.unwrap_or(self.break_threshold_minutes);
        ensure!(
            (1..=MAX_BREAK_MINUTES).contains(&minutes),
            "break threshold must be between 1 and {MAX_BREAK_MINUTES} minutes, got {minutes}"
        );
        Ok(SliceConfig::default()
            .with_break_minutes(minutes)
            .with_day_boundary(self.day_boundary))
    }

    /// Path of the log file for `date`.
    pub fn log_path(&self, date: NaiveDate) -> PathBuf {
        self.log_dir
            .join(format!("{}.{}", date.format("%Y-%m-%d"), self.file_extension))
    }
}

/// Returns the platform-specific config directory for tally.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tally"))
}

/// Returns the platform-specific data directory for tally.
///
/// On Linux: `~/.local/share/tally`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tally"))
}
