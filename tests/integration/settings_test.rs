use win_os_info::core::settings::{parse_settings, render_settings, setting_kind, SettingKind};
use win_os_info::core::SettingValue;

#[test]
fn test_keys_match_line_names() {
    let text = "NotificationLevel : 3\nRequired : True\nNextDetectionTime : 2024-01-01\nFeatureUpdatesEnabled : 0";
    let parsed = parse_settings(text);

    let names: Vec<_> = parsed.settings.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        ["FeatureUpdatesEnabled", "NextDetectionTime", "NotificationLevel", "Required"]
    );

    for (name, value) in &parsed.settings {
        let matches_kind = matches!(
            (setting_kind(name), value),
            (SettingKind::Integer, SettingValue::Integer(_))
                | (SettingKind::Boolean, SettingValue::Boolean(_))
                | (SettingKind::Text, SettingValue::Text(_))
        );
        assert!(matches_kind, "{name} has the wrong type");
    }
}

#[test]
fn test_render_parse_round_trip() {
    let text = "AUOptions: 4\nReadOnly: True\nNextDetectionTime: 2024-01-01 10:00:00\nComment: a: b";
    let first = parse_settings(text);
    assert!(first.warnings.is_empty());

    let rendered = render_settings(&first.settings);
    let second = parse_settings(&rendered);
    assert_eq!(first.settings, second.settings);
}

#[test]
fn test_malformed_lines_never_panic() {
    let inputs = [
        ":",
        "::::",
        "no colon here",
        "\n\n\r\n",
        "ReadOnly:",
        "NotificationLevel: 99999999999999999999999",
        "ScheduledInstallationDay: -1",
        "\u{feff}ReadOnly : True",
    ];

    for input in inputs {
        let parsed = parse_settings(input);
        for warning in &parsed.warnings {
            assert!(!warning.reason.is_empty());
        }
    }

    let parsed = parse_settings("no colon here");
    assert!(parsed.settings.is_empty());
    assert_eq!(parsed.warnings.len(), 1);

    // Negative values still parse as integers
    let parsed = parse_settings("ScheduledInstallationDay: -1");
    assert_eq!(
        parsed.settings["ScheduledInstallationDay"],
        SettingValue::Integer(-1)
    );
}
