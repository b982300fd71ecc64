use std::collections::BTreeMap;

use serde::Serialize;

use super::settings::{SettingValue, UpdateSettings};

pub const VERSION_MEASUREMENT: &str = "win_os_version";
pub const UPDATE_STATUS_MEASUREMENT: &str = "win_os_update_status";
pub const UPDATE_RESULTS_MEASUREMENT: &str = "win_os_results";
pub const AUTO_UPDATE_SETTINGS_MEASUREMENT: &str = "win_os_update_settings";
pub const UPDATE_SETTINGS_MEASUREMENT: &str = "win_os_settings";

/// A single field value handed to a sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Unsigned(u64),
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Unsigned(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<SettingValue> for FieldValue {
    fn from(v: SettingValue) -> Self {
        match v {
            SettingValue::Integer(n) => FieldValue::Integer(n),
            SettingValue::Boolean(b) => FieldValue::Boolean(b),
            SettingValue::Text(s) => FieldValue::Text(s),
        }
    }
}

pub type Fields = BTreeMap<String, FieldValue>;
pub type Tags = BTreeMap<String, String>;

/// The unit handed to a [`MetricsSink`](super::sink::MetricsSink)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricRecord {
    pub measurement: String,
    pub fields: Fields,
    pub tags: Tags,
}

/// Turns a typed record into sink fields
pub trait Measurement {
    fn measurement(&self) -> &'static str;

    fn fields(&self) -> Fields;

    fn to_record(&self, tags: &Tags) -> MetricRecord {
        MetricRecord {
            measurement: self.measurement().to_string(),
            fields: self.fields(),
            tags: tags.clone(),
        }
    }
}

fn fields<const N: usize>(pairs: [(&str, FieldValue); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

// Version

/// Version values from `HKLM\SOFTWARE\Microsoft\Windows NT\CurrentVersion`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryVersion {
    pub product_name: String,
    pub current_build_number: String,
    pub current_version: String,
}

/// Version reported by `Win32_OperatingSystem`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellVersion {
    pub major: u64,
    pub minor: u64,
    pub build: u64,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VersionInfo {
    Registry(RegistryVersion),
    Shell(ShellVersion),
}

impl Measurement for VersionInfo {
    fn measurement(&self) -> &'static str {
        VERSION_MEASUREMENT
    }

    fn fields(&self) -> Fields {
        match self {
            VersionInfo::Registry(v) => fields([
                ("ProductName", v.product_name.as_str().into()),
                ("CurrentBuildNumber", v.current_build_number.as_str().into()),
                ("CurrentVersion", v.current_version.as_str().into()),
            ]),
            VersionInfo::Shell(v) => fields([
                ("Major", v.major.into()),
                ("Minor", v.minor.into()),
                ("Build", v.build.into()),
                ("Caption", v.caption.as_str().into()),
            ]),
        }
    }
}

// Update history

/// Last successful Windows Update phases, as stored by the update agent.
/// Dates are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateStatus {
    pub last_success_detect_date: String,
    pub last_success_download_date: String,
    pub last_success_install_date: String,
    pub time_zone_key_name: String,
}

/// Results of `Microsoft.Update.AutoUpdate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateResults {
    pub last_update_date: String,
    pub last_search_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UpdateHistory {
    Status(UpdateStatus),
    Results(UpdateResults),
}

impl Measurement for UpdateHistory {
    fn measurement(&self) -> &'static str {
        match self {
            UpdateHistory::Status(_) => UPDATE_STATUS_MEASUREMENT,
            UpdateHistory::Results(_) => UPDATE_RESULTS_MEASUREMENT,
        }
    }

    fn fields(&self) -> Fields {
        match self {
            UpdateHistory::Status(s) => fields([
                ("LastSuccessDetectDate", s.last_success_detect_date.as_str().into()),
                ("LastSuccessDownloadDate", s.last_success_download_date.as_str().into()),
                ("LastSuccessInstallDate", s.last_success_install_date.as_str().into()),
                ("TimeZoneKeyName", s.time_zone_key_name.as_str().into()),
            ]),
            UpdateHistory::Results(r) => fields([
                ("LastUpdateDate", r.last_update_date.as_str().into()),
                ("LastSearchDate", r.last_search_date.as_str().into()),
            ]),
        }
    }
}

// Update settings

/// Values under `...\WindowsUpdate\Auto Update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoUpdateSettings {
    pub au_options: u64,
    pub include_recommended_updates: u64,
    pub elevate_non_admins: u64,
    pub next_detection_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UpdateSettingsInfo {
    Registry(AutoUpdateSettings),
    Shell(UpdateSettings),
}

impl Measurement for UpdateSettingsInfo {
    fn measurement(&self) -> &'static str {
        match self {
            UpdateSettingsInfo::Registry(_) => AUTO_UPDATE_SETTINGS_MEASUREMENT,
            UpdateSettingsInfo::Shell(_) => UPDATE_SETTINGS_MEASUREMENT,
        }
    }

    fn fields(&self) -> Fields {
        match self {
            UpdateSettingsInfo::Registry(s) => fields([
                ("AUOptions", s.au_options.into()),
                ("IncludeRecommendedUpdates", s.include_recommended_updates.into()),
                ("ElevateNonAdmins", s.elevate_non_admins.into()),
                ("NextDetectionTime", s.next_detection_time.as_str().into()),
            ]),
            UpdateSettingsInfo::Shell(settings) => settings
                .iter()
                .map(|(name, value)| (name.clone(), value.clone().into()))
                .collect(),
        }
    }
}
