use win_os_info::core::providers::registry::{
    AUTO_UPDATE_KEY, DETECT_RESULTS_KEY, DOWNLOAD_RESULTS_KEY, INSTALL_RESULTS_KEY,
    TIME_ZONE_KEY, VERSION_KEY,
};
use win_os_info::core::{
    CollectorConfig, ErrorPolicy, FieldValue, MemorySink, OsInfoCollector, OsInfoProvider,
    RegistryProvider,
};
use win_os_info::platform::{MemoryRegistry, RootKey};
use win_os_info::WinOsError;

const HKLM: RootKey = RootKey::LocalMachine;

fn full_registry() -> MemoryRegistry {
    MemoryRegistry::new()
        .with_value(HKLM, VERSION_KEY, "ProductName", "Windows 10 Pro")
        .with_value(HKLM, VERSION_KEY, "CurrentBuildNumber", "19045")
        .with_value(HKLM, VERSION_KEY, "CurrentVersion", "6.3")
        .with_value(HKLM, INSTALL_RESULTS_KEY, "LastSuccessTime", "2024-01-02 10:30:00")
        .with_value(HKLM, DOWNLOAD_RESULTS_KEY, "LastSuccessTime", "2024-01-02 10:05:00")
        .with_value(HKLM, DETECT_RESULTS_KEY, "LastSuccessTime", "2024-01-02 10:00:00")
        .with_value(HKLM, TIME_ZONE_KEY, "TimeZoneKeyName", "Pacific Standard Time")
        .with_value(HKLM, AUTO_UPDATE_KEY, "AUOptions", 4u32)
        .with_value(HKLM, AUTO_UPDATE_KEY, "IncludeRecommendedUpdates", 1u32)
        .with_value(HKLM, AUTO_UPDATE_KEY, "ElevateNonAdmins", 1u64)
        .with_value(HKLM, AUTO_UPDATE_KEY, "NextDetectionTime", "2024-01-03 04:00:00")
}

#[test]
fn test_version_record_end_to_end() {
    let config = CollectorConfig {
        update_history: false,
        update_settings: false,
        ..Default::default()
    };
    let mut collector = OsInfoCollector::with_config(RegistryProvider::new(full_registry()), config);
    let mut sink = MemorySink::new();

    collector.gather(&mut sink).unwrap();

    assert_eq!(sink.records.len(), 1);
    let record = &sink.records[0];
    assert_eq!(record.measurement, "win_os_version");
    assert_eq!(record.fields.len(), 3);
    assert_eq!(record.fields["ProductName"], FieldValue::from("Windows 10 Pro"));
    assert_eq!(record.fields["CurrentBuildNumber"], FieldValue::from("19045"));
    assert_eq!(record.fields["CurrentVersion"], FieldValue::from("6.3"));
    assert!(record.tags.is_empty());
}

#[test]
fn test_all_categories() {
    let mut collector = OsInfoCollector::new(RegistryProvider::new(full_registry()));
    let mut sink = MemorySink::new();

    let report = collector.gather(&mut sink).unwrap();
    assert_eq!(report.emitted, 3);

    let status = sink.measurement("win_os_update_status");
    assert_eq!(status.len(), 1);
    assert_eq!(
        status[0].fields["TimeZoneKeyName"],
        FieldValue::from("Pacific Standard Time")
    );

    let settings = sink.measurement("win_os_update_settings");
    assert_eq!(settings[0].fields["AUOptions"], FieldValue::Unsigned(4));
    assert_eq!(settings[0].fields["ElevateNonAdmins"], FieldValue::Unsigned(1));
}

#[test]
fn test_failed_read_emits_nothing_for_that_record() {
    let mut registry = MemoryRegistry::new();
    registry.set_value(HKLM, VERSION_KEY, "ProductName", "Windows 10 Pro");
    registry.set_value(HKLM, VERSION_KEY, "CurrentBuildNumber", 19045u32);
    registry.set_value(HKLM, VERSION_KEY, "CurrentVersion", "6.3");

    let provider = RegistryProvider::new(registry);
    assert!(matches!(
        provider.read_version(),
        Err(WinOsError::TypeMismatch { .. })
    ));

    let config = CollectorConfig {
        error_policy: ErrorPolicy::FailFast,
        ..Default::default()
    };
    let mut collector = OsInfoCollector::with_config(provider, config);
    let mut sink = MemorySink::new();

    assert!(collector.gather(&mut sink).is_err());
    assert!(sink.records.is_empty());
}

#[test]
fn test_continue_policy_reports_every_failure() {
    // Only the version key exists
    let registry = MemoryRegistry::new()
        .with_value(HKLM, VERSION_KEY, "ProductName", "Windows 11 Enterprise")
        .with_value(HKLM, VERSION_KEY, "CurrentBuildNumber", "22631")
        .with_value(HKLM, VERSION_KEY, "CurrentVersion", "6.3");

    let mut collector = OsInfoCollector::new(RegistryProvider::new(registry));
    let mut sink = MemorySink::new();

    let report = collector.gather(&mut sink).unwrap();
    assert_eq!(report.emitted, 1);
    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .all(|(_, e)| matches!(e, WinOsError::KeyNotFound { .. })));
    assert_eq!(sink.records[0].measurement, "win_os_version");
}
