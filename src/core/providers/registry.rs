use log::warn;

use super::{OsInfoProvider, Strategy};
use crate::core::records::{
    AutoUpdateSettings, RegistryVersion, UpdateHistory, UpdateSettingsInfo, UpdateStatus,
    VersionInfo,
};
use crate::error::Result;
use crate::platform::registry::{
    read_string_value, AccessMode, KeyValueStore, RegistryKey, RootKey,
};

pub const VERSION_KEY: &str = r"SOFTWARE\Microsoft\Windows NT\CurrentVersion";
pub const AUTO_UPDATE_KEY: &str =
    r"SOFTWARE\Microsoft\Windows\CurrentVersion\WindowsUpdate\Auto Update";
pub const INSTALL_RESULTS_KEY: &str =
    r"SOFTWARE\Microsoft\Windows\CurrentVersion\WindowsUpdate\Auto Update\Results\Install";
pub const DOWNLOAD_RESULTS_KEY: &str =
    r"SOFTWARE\Microsoft\Windows\CurrentVersion\WindowsUpdate\Auto Update\Results\Download";
pub const DETECT_RESULTS_KEY: &str =
    r"SOFTWARE\Microsoft\Windows\CurrentVersion\WindowsUpdate\Auto Update\Results\Detect";
pub const TIME_ZONE_KEY: &str = r"SYSTEM\CurrentControlSet\Control\TimeZoneInformation";

const ROOT: RootKey = RootKey::LocalMachine;

/// Reads OS information straight from `HKEY_LOCAL_MACHINE`
#[derive(Debug, Clone, Default)]
pub struct RegistryProvider<S> {
    store: S,
}

impl<S: KeyValueStore> RegistryProvider<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn open(&self, path: &str) -> Result<S::Key> {
        self.store
            .open(ROOT, path, AccessMode::QueryValue)
            .inspect_err(|e| warn!("Error while accessing registry key {}: {}", ROOT.join(path), e))
    }
}

fn string<K: RegistryKey>(key: &K, name: &str) -> Result<String> {
    key.read_string(name)
        .inspect_err(|e| warn!("Error while obtaining value {}: {}", name, e))
}

fn integer<K: RegistryKey>(key: &K, name: &str) -> Result<u64> {
    key.read_integer(name)
        .inspect_err(|e| warn!("Error while obtaining value {}: {}", name, e))
}

impl<S: KeyValueStore> OsInfoProvider for RegistryProvider<S> {
    fn strategy(&self) -> Strategy {
        Strategy::Registry
    }

    fn read_version(&self) -> Result<VersionInfo> {
        let key = self.open(VERSION_KEY)?;

        Ok(VersionInfo::Registry(RegistryVersion {
            product_name: string(&key, "ProductName")?,
            current_build_number: string(&key, "CurrentBuildNumber")?,
            current_version: string(&key, "CurrentVersion")?,
        }))
    }

    fn read_update_history(&self) -> Result<UpdateHistory> {
        let store = &self.store;

        let last_success_install_date =
            read_string_value(store, ROOT, INSTALL_RESULTS_KEY, "LastSuccessTime")?;
        let last_success_download_date =
            read_string_value(store, ROOT, DOWNLOAD_RESULTS_KEY, "LastSuccessTime")?;
        let last_success_detect_date =
            read_string_value(store, ROOT, DETECT_RESULTS_KEY, "LastSuccessTime")?;
        let time_zone_key_name = read_string_value(store, ROOT, TIME_ZONE_KEY, "TimeZoneKeyName")?;

        Ok(UpdateHistory::Status(UpdateStatus {
            last_success_detect_date,
            last_success_download_date,
            last_success_install_date,
            time_zone_key_name,
        }))
    }

    fn read_update_settings(&self) -> Result<UpdateSettingsInfo> {
        let key = self.open(AUTO_UPDATE_KEY)?;

        Ok(UpdateSettingsInfo::Registry(AutoUpdateSettings {
            au_options: integer(&key, "AUOptions")?,
            include_recommended_updates: integer(&key, "IncludeRecommendedUpdates")?,
            elevate_non_admins: integer(&key, "ElevateNonAdmins")?,
            next_detection_time: string(&key, "NextDetectionTime")?,
        }))
    }
}
