//! Sources of OS information.
//!
//! [`OsInfoProvider`] is the only thing the collector knows about. The
//! registry and shell providers fill the same three categories from
//! different places; tests plug in their own.

pub mod registry;
pub mod shell;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::records::{UpdateHistory, UpdateSettingsInfo, VersionInfo};
use crate::error::{Result, WinOsError};

pub use registry::RegistryProvider;
pub use shell::ShellProvider;

/// Where a provider reads its values from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Registry,
    Shell,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Registry => f.write_str("registry"),
            Strategy::Shell => f.write_str("shell"),
        }
    }
}

impl FromStr for Strategy {
    type Err = WinOsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "registry" => Ok(Strategy::Registry),
            "shell" | "powershell" => Ok(Strategy::Shell),
            other => Err(WinOsError::config(format!(
                "unknown strategy '{}' (expected 'registry' or 'shell')",
                other
            ))),
        }
    }
}

/// Each provider builds whole records: the first failed read aborts the
/// record and its error is returned.
pub trait OsInfoProvider {
    fn strategy(&self) -> Strategy;

    fn read_version(&self) -> Result<VersionInfo>;

    fn read_update_history(&self) -> Result<UpdateHistory>;

    fn read_update_settings(&self) -> Result<UpdateSettingsInfo>;
}

impl<P: OsInfoProvider + ?Sized> OsInfoProvider for Box<P> {
    fn strategy(&self) -> Strategy {
        (**self).strategy()
    }

    fn read_version(&self) -> Result<VersionInfo> {
        (**self).read_version()
    }

    fn read_update_history(&self) -> Result<UpdateHistory> {
        (**self).read_update_history()
    }

    fn read_update_settings(&self) -> Result<UpdateSettingsInfo> {
        (**self).read_update_settings()
    }
}
