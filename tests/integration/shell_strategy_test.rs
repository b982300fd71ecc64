use std::cell::RefCell;

use win_os_info::core::providers::shell::{
    CAPTION_SCRIPT, LAST_INSTALL_SCRIPT, LAST_SEARCH_SCRIPT, SETTINGS_SCRIPT, VERSION_SCRIPT,
};
use win_os_info::core::{FieldValue, MemorySink, OsInfoCollector, ShellProvider};
use win_os_info::platform::{CommandRunner, PowerShell};
use win_os_info::{Result, WinOsError};

/// Answers like a Windows 10 host and records every script it was given
#[derive(Default)]
struct FakePowerShell {
    calls: RefCell<Vec<String>>,
    broken_settings: bool,
}

impl CommandRunner for FakePowerShell {
    fn execute(&self, script: &str) -> Result<String> {
        self.calls.borrow_mut().push(script.to_string());

        let out = match script {
            VERSION_SCRIPT => "10.0.19045\r\n",
            CAPTION_SCRIPT => "  Microsoft Windows 10 Pro  \n",
            LAST_INSTALL_SCRIPT => "1/2/2024 10:30:00 AM\r\n",
            LAST_SEARCH_SCRIPT => "1/2/2024 10:00:00 AM\r\n",
            SETTINGS_SCRIPT if self.broken_settings => {
                return Err(WinOsError::NonZeroExit {
                    command: script.to_string(),
                    code: Some(1),
                    stderr: "Retrieving the COM class factory failed".to_string(),
                })
            }
            SETTINGS_SCRIPT => {
                "\r\nNotificationLevel         : 4\r\nReadOnly                  : False\r\nScheduledInstallationTime : 3\r\n\r\n"
            }
            other => panic!("unexpected script {other}"),
        };
        Ok(out.to_string())
    }
}

#[test]
fn test_shell_strategy_end_to_end() {
    let runner = FakePowerShell::default();
    let mut collector = OsInfoCollector::new(ShellProvider::new(&runner));
    let mut sink = MemorySink::new();

    let report = collector.gather(&mut sink).unwrap();
    assert!(report.is_clean());

    let version = &sink.measurement("win_os_version")[0];
    assert_eq!(version.fields["Major"], FieldValue::Unsigned(10));
    assert_eq!(version.fields["Minor"], FieldValue::Unsigned(0));
    assert_eq!(version.fields["Build"], FieldValue::Unsigned(19045));
    assert_eq!(version.fields["Caption"], FieldValue::from("Microsoft Windows 10 Pro"));

    let results = &sink.measurement("win_os_results")[0];
    assert_eq!(results.fields["LastUpdateDate"], FieldValue::from("1/2/2024 10:30:00 AM"));

    let settings = &sink.measurement("win_os_settings")[0];
    assert_eq!(settings.fields["NotificationLevel"], FieldValue::Integer(4));
    assert_eq!(settings.fields["ReadOnly"], FieldValue::Boolean(false));

    assert_eq!(runner.calls.borrow().len(), 5);
}

#[test]
fn test_failed_settings_query_is_reported_not_emitted() {
    let runner = FakePowerShell {
        broken_settings: true,
        ..Default::default()
    };
    let mut collector = OsInfoCollector::new(ShellProvider::new(&runner));
    let mut sink = MemorySink::new();

    let report = collector.gather(&mut sink).unwrap();
    assert_eq!(report.emitted, 2);
    assert_eq!(report.failures.len(), 1);
    assert!(sink.measurement("win_os_settings").is_empty());
}

#[test]
fn test_unlocatable_interpreter_fails_up_front() {
    let result = PowerShell::locate_program("no-such-powershell-7f3a.exe");
    assert!(matches!(result, Err(WinOsError::InterpreterNotFound { .. })));
}

#[test]
fn test_build_provider_without_interpreter_fails() {
    let config = win_os_info::Config {
        strategy: win_os_info::core::Strategy::Shell,
        interpreter: Some("no-such-powershell-7f3a.exe".to_string()),
        ..Default::default()
    };

    // Every attempt fails the same way; no collector is ever built
    for _ in 0..3 {
        assert!(win_os_info::commands::build_collector(&config).is_err());
    }
}
