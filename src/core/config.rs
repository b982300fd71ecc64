use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::collector::{CollectorConfig, ErrorPolicy};
use super::providers::Strategy;
use super::sink::is_valid_tag;
use crate::error::WinOsError;

/// How records are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// InfluxDB line protocol
    #[default]
    Line,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = WinOsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "line" | "influx" => Ok(OutputFormat::Line),
            "json" => Ok(OutputFormat::Json),
            other => Err(WinOsError::config(format!(
                "unknown format '{}' (expected 'line' or 'json')",
                other
            ))),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval() -> String {
    "3600s".to_string()
}

fn default_command_timeout() -> String {
    "30s".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where values come from: registry or shell
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default = "default_true", alias = "OsVersion")]
    pub os_version: bool,
    /// Update status (registry) or update results (shell)
    #[serde(default = "default_true", alias = "UpdateStatus", alias = "Results")]
    pub update_history: bool,
    #[serde(default = "default_true", alias = "UpdateSettings", alias = "Settings")]
    pub update_settings: bool,
    /// Time between two collections, e.g. `"3600s"`
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Upper bound for a single PowerShell query
    #[serde(default = "default_command_timeout")]
    pub command_timeout: String,
    /// Interpreter to use instead of `powershell.exe`
    #[serde(default)]
    pub interpreter: Option<String>,
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    #[serde(default)]
    pub format: OutputFormat,
    /// Tags attached to every record
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            os_version: true,
            update_history: true,
            update_settings: true,
            interval: default_interval(),
            command_timeout: default_command_timeout(),
            interpreter: None,
            error_policy: ErrorPolicy::default(),
            format: OutputFormat::default(),
            tags: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load the config from the default location, or defaults if there is none
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        if !config_path.exists() {
            return Ok(Config::default());
        }
        Self::load_from(&config_path)
    }

    /// Load the config from `path`; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if data.trim().is_empty() {
            return Ok(Config::default());
        }

        let config: Config = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }
        }

        fs::write(path, self.sample())
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("win-os-info").join("config.json"))
    }

    /// Check the duration strings up front so a bad file fails at startup
    pub fn validate(&self) -> Result<()> {
        self.interval()?;
        self.command_timeout()?;

        if let Some((key, value)) = self.tags.iter().find(|(k, v)| !is_valid_tag(k, v)) {
            bail!(
                "Invalid tag {:?}={:?}: keys and values must be non-empty single lines",
                key,
                value
            );
        }
        Ok(())
    }

    /// Pretty-printed JSON of this config
    pub fn sample(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn interval(&self) -> Result<Duration> {
        parse_duration(&self.interval)
            .with_context(|| format!("Invalid interval {:?}", self.interval))
    }

    pub fn command_timeout(&self) -> Result<Duration> {
        parse_duration(&self.command_timeout)
            .with_context(|| format!("Invalid command_timeout {:?}", self.command_timeout))
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            os_version: self.os_version,
            update_history: self.update_history,
            update_settings: self.update_settings,
            error_policy: self.error_policy,
        }
    }
}

/// Longest accepted interval or timeout
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 86_400);

/// Parse `"500ms"`, `"20s"`, `"5m"`, `"1h"`; a bare number is seconds
pub fn parse_duration(text: &str) -> std::result::Result<Duration, WinOsError> {
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);

    let value: u64 = number
        .parse()
        .map_err(|_| WinOsError::config(format!("'{}' does not start with a number", text)))?;

    let secs = |factor: u64| {
        value
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| WinOsError::config(format!("'{}' is too large", text)))
    };

    let duration = match unit.trim() {
        "ms" => Duration::from_millis(value),
        "" | "s" => secs(1)?,
        "m" => secs(60)?,
        "h" => secs(3600)?,
        other => {
            return Err(WinOsError::config(format!(
                "unknown duration unit '{}' in '{}'",
                other, text
            )))
        }
    };

    if duration.is_zero() {
        return Err(WinOsError::config(format!("'{}' must be greater than zero", text)));
    }
    if duration > MAX_DURATION {
        return Err(WinOsError::config(format!(
            "'{}' is longer than {} days",
            text,
            MAX_DURATION.as_secs() / 86_400
        )));
    }

    Ok(duration)
}
