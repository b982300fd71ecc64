use log::{debug, warn};

use super::{OsInfoProvider, Strategy};
use crate::core::records::{
    ShellVersion, UpdateHistory, UpdateResults, UpdateSettingsInfo, VersionInfo,
};
use crate::core::settings::parse_settings;
use crate::error::{Result, WinOsError};
use crate::platform::shell::CommandRunner;

pub const VERSION_SCRIPT: &str = "(Get-CimInstance Win32_OperatingSystem).Version";
pub const CAPTION_SCRIPT: &str = "(Get-CimInstance Win32_OperatingSystem).Caption";
pub const LAST_INSTALL_SCRIPT: &str =
    "(New-Object -ComObject Microsoft.Update.AutoUpdate).Results.LastInstallationSuccessDate";
pub const LAST_SEARCH_SCRIPT: &str =
    "(New-Object -ComObject Microsoft.Update.AutoUpdate).Results.LastSearchSuccessDate";
pub const SETTINGS_SCRIPT: &str = "(New-Object -ComObject Microsoft.Update.AutoUpdate).Settings";

/// Reads OS information by running PowerShell queries
#[derive(Debug, Clone)]
pub struct ShellProvider<R> {
    runner: R,
}

impl<R: CommandRunner> ShellProvider<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn run_trimmed(&self, script: &str) -> Result<String> {
        self.runner
            .execute(script)
            .map(|out| out.trim().to_string())
            .inspect_err(|e| warn!("Query failed: {}", e))
    }
}

/// Split `10.0.19045` (or the same numbers spread over lines) into major, minor, build
pub fn parse_version(text: &str) -> Result<(u64, u64, u64)> {
    let mut parts = text
        .split(|c: char| c == '.' || c.is_whitespace())
        .filter(|part| !part.is_empty());

    let mut next = |label: &str| -> Result<u64> {
        let part = parts
            .next()
            .ok_or_else(|| WinOsError::parse(format!("version {:?} has no {} part", text.trim(), label)))?;
        part.parse::<u64>().map_err(|e| {
            WinOsError::parse(format!("{} version {:?} is not a number: {}", label, part, e))
        })
    };

    let major = next("major")?;
    let minor = next("minor")?;
    let build = next("build")?;
    Ok((major, minor, build))
}

impl<R: CommandRunner> OsInfoProvider for ShellProvider<R> {
    fn strategy(&self) -> Strategy {
        Strategy::Shell
    }

    fn read_version(&self) -> Result<VersionInfo> {
        let version = self.run_trimmed(VERSION_SCRIPT)?;
        let (major, minor, build) = parse_version(&version)?;
        let caption = self.run_trimmed(CAPTION_SCRIPT)?;

        Ok(VersionInfo::Shell(ShellVersion {
            major,
            minor,
            build,
            caption,
        }))
    }

    fn read_update_history(&self) -> Result<UpdateHistory> {
        Ok(UpdateHistory::Results(UpdateResults {
            last_update_date: self.run_trimmed(LAST_INSTALL_SCRIPT)?,
            last_search_date: self.run_trimmed(LAST_SEARCH_SCRIPT)?,
        }))
    }

    fn read_update_settings(&self) -> Result<UpdateSettingsInfo> {
        let output = self.run_trimmed(SETTINGS_SCRIPT)?;
        let parsed = parse_settings(&output);

        for warning in &parsed.warnings {
            warn!("Skipping update setting, {}", warning);
        }

        if parsed.settings.is_empty() {
            return Err(WinOsError::parse(format!(
                "no update settings in output of '{}'",
                SETTINGS_SCRIPT
            )));
        }

        debug!("Parsed {} update settings", parsed.settings.len());
        Ok(UpdateSettingsInfo::Shell(parsed.settings))
    }
}
