use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date_util::{local_today, parse_date};
use crate::error::{Error, Result};
use crate::metrics::StatsOptions;

/// Settable keys, in listing order.
pub const KEYS: &[&str] = &[
    "top_n",
    "pass_percentage",
    "attendance_alert_threshold",
    "today",
];

/// User settings, stored as JSON (default `~/.classstats/config.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub top_n: usize,
    pub pass_percentage: f64,
    pub attendance_alert_threshold: f64,
    /// Pins "today" for every window and status derivation.
    pub today: Option<NaiveDate>,
}

impl Default for Config {
    fn default() -> Self {
        let opts = StatsOptions::default();
        Self {
            top_n: opts.top_n,
            pass_percentage: opts.pass_percentage,
            attendance_alert_threshold: opts.attendance_alert_threshold,
            today: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
            .join(".classstats");
        Ok(dir.join("config.json"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path()?)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(Error::Config("top_n must be at least 1".into()));
        }
        check_percentage("pass_percentage", self.pass_percentage)?;
        check_percentage(
            "attendance_alert_threshold",
            self.attendance_alert_threshold,
        )?;
        Ok(())
    }

    /// Value of `key`, `None` when it is unset.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "top_n" => Some(self.top_n.to_string()),
            "pass_percentage" => Some(self.pass_percentage.to_string()),
            "attendance_alert_threshold" => Some(self.attendance_alert_threshold.to_string()),
            "today" => self.today.map(|d| d.to_string()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Parse and store `value` under `key`. `today` accepts `none` to clear it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let mut next = self.clone();
        match key {
            "top_n" => {
                next.top_n = value.parse().map_err(|_| {
                    Error::Config(format!("top_n must be a whole number, got '{value}'"))
                })?;
            }
            "pass_percentage" => next.pass_percentage = parse_number(key, value)?,
            "attendance_alert_threshold" => {
                next.attendance_alert_threshold = parse_number(key, value)?
            }
            "today" => {
                next.today = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(parse_date(value)?)
                };
            }
            _ => return Err(unknown_key(key)),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Every key that has a value.
    pub fn list(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .filter_map(|&key| self.get(key).ok().flatten().map(|v| (key, v)))
            .collect()
    }

    /// The pinned date, or the local calendar date.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(local_today)
    }

    pub fn stats_options(&self) -> StatsOptions {
        StatsOptions {
            top_n: self.top_n,
            pass_percentage: self.pass_percentage,
            attendance_alert_threshold: self.attendance_alert_threshold,
        }
    }
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!(
        "unknown key '{key}' (expected one of: {})",
        KEYS.join(", ")
    ))
}

fn parse_number(key: &str, value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got '{value}'")))
}

fn check_percentage(key: &str, value: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(Error::Config(format!(
            "{key} must be between 0 and 100, got {value}"
        )));
    }
    Ok(())
}
