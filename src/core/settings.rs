//! Parsing of `name: value` listings into typed update settings.
//!
//! PowerShell prints COM objects as one `Name : Value` pair per line. The value
//! type is not part of the output, so it is taken from [`SETTING_KINDS`]: names
//! listed there are coerced to integers or booleans, everything else stays text.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Typed value of a single update setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Integer(n) => write!(f, "{}", n),
            SettingValue::Boolean(true) => f.write_str("True"),
            SettingValue::Boolean(false) => f.write_str("False"),
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}

/// Update settings keyed by name, in name order
pub type UpdateSettings = BTreeMap<String, SettingValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Integer,
    Boolean,
    Text,
}

/// Settings whose values are not plain text
pub const SETTING_KINDS: &[(&str, SettingKind)] = &[
    ("NotificationLevel", SettingKind::Integer),
    ("ScheduledInstallationDay", SettingKind::Integer),
    ("ScheduledInstallationTime", SettingKind::Integer),
    ("IncludeRecommendedUpdates", SettingKind::Integer),
    ("AUOptions", SettingKind::Integer),
    ("ReadOnly", SettingKind::Boolean),
    ("Required", SettingKind::Boolean),
    ("NonAdministratorElevated", SettingKind::Boolean),
    ("FeatureUpdatesEnabled", SettingKind::Boolean),
];

/// Kind of the setting called `name`; unknown names are text
pub fn setting_kind(name: &str) -> SettingKind {
    SETTING_KINDS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, kind)| *kind)
        .unwrap_or(SettingKind::Text)
}

/// A line that was skipped while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number in the trimmed block
    pub line: usize,
    pub content: String,
    pub reason: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({:?})", self.line, self.reason, self.content)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSettings {
    pub settings: UpdateSettings,
    pub warnings: Vec<ParseWarning>,
}

/// Boolean literals in the forms .NET and most shells print them
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn coerce(name: &str, value: &str) -> Result<SettingValue, String> {
    match setting_kind(name) {
        SettingKind::Integer => value
            .parse::<i64>()
            .map(SettingValue::Integer)
            .map_err(|e| format!("{} is not an integer: {}", name, e)),
        SettingKind::Boolean => parse_bool(value)
            .map(SettingValue::Boolean)
            .ok_or_else(|| format!("{} is not a boolean", name)),
        SettingKind::Text => Ok(SettingValue::Text(value.to_string())),
    }
}

/// Parse a `name: value` block.
///
/// Each line is split on its first colon only, so values may contain colons
/// (times, for instance). Lines without a colon, with an empty name, or whose
/// value does not fit the setting's kind are skipped and reported in
/// [`ParsedSettings::warnings`]. A repeated name keeps its last value.
pub fn parse_settings(text: &str) -> ParsedSettings {
    let mut parsed = ParsedSettings::default();

    for (idx, raw) in text.trim().lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let warn = |reason: String| ParseWarning {
            line: idx + 1,
            content: line.to_string(),
            reason,
        };

        let Some((name, value)) = line.split_once(':') else {
            parsed.warnings.push(warn("missing ':' separator".to_string()));
            continue;
        };

        let name = name.trim();
        let value = value.trim();

        if name.is_empty() {
            parsed.warnings.push(warn("empty setting name".to_string()));
            continue;
        }

        match coerce(name, value) {
            Ok(typed) => {
                parsed.settings.insert(name.to_string(), typed);
            }
            Err(reason) => parsed.warnings.push(warn(reason)),
        }
    }

    parsed
}

/// Write settings back as `name: value` lines
pub fn render_settings(settings: &UpdateSettings) -> String {
    settings
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const COM_OUTPUT: &str = "
NotificationLevel         : 4
ReadOnly                  : False
Required                  : False
ScheduledInstallationDay  : 0
ScheduledInstallationTime : 3
IncludeRecommendedUpdates : 1
NonAdministratorsElevated : True
FeatureUpdatesEnabled     : True

";

    #[test]
    fn test_types_follow_table() {
        let parsed = parse_settings(COM_OUTPUT);
        assert!(parsed.warnings.is_empty());

        let s = &parsed.settings;
        assert_eq!(s.len(), 8);
        assert_eq!(s["NotificationLevel"], SettingValue::Integer(4));
        assert_eq!(s["ReadOnly"], SettingValue::Boolean(false));
        assert_eq!(s["ScheduledInstallationTime"], SettingValue::Integer(3));
        assert_eq!(s["FeatureUpdatesEnabled"], SettingValue::Boolean(true));
        // Not in the table: the COM property is spelled differently
        assert_eq!(
            s["NonAdministratorsElevated"],
            SettingValue::Text("True".to_string())
        );
    }

    #[test]
    fn test_single_lines() {
        let s = parse_settings("AUOptions: 4").settings;
        assert_eq!(s["AUOptions"], SettingValue::Integer(4));

        let s = parse_settings("ReadOnly: True").settings;
        assert_eq!(s["ReadOnly"], SettingValue::Boolean(true));

        let s = parse_settings("NextDetectionTime: 2024-01-01").settings;
        assert_eq!(
            s["NextDetectionTime"],
            SettingValue::Text("2024-01-01".to_string())
        );
    }

    #[test]
    fn test_splits_on_first_colon_only() {
        let s = parse_settings("NextDetectionTime : 2024-01-01 03:15:00").settings;
        assert_eq!(
            s["NextDetectionTime"],
            SettingValue::Text("2024-01-01 03:15:00".to_string())
        );
    }

    #[test]
    fn test_line_without_colon_is_skipped() {
        let parsed = parse_settings("NotificationLevel : 4\ngarbage line\nReadOnly : True");
        assert_eq!(parsed.settings.len(), 2);
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].line, 2);
        assert_eq!(parsed.warnings[0].content, "garbage line");
    }

    #[test]
    fn test_bad_values_are_skipped_not_zeroed() {
        let parsed = parse_settings("NotificationLevel : four\nReadOnly : maybe\n : 3");
        assert!(parsed.settings.is_empty());
        assert_eq!(parsed.warnings.len(), 3);
        assert!(parsed.warnings[0].reason.contains("not an integer"));
        assert!(parsed.warnings[1].reason.contains("not a boolean"));
        assert_eq!(parsed.warnings[2].reason, "empty setting name");
    }

    #[test]
    fn test_crlf_and_blank_input() {
        let parsed = parse_settings("ReadOnly : True\r\nRequired : 0\r\n");
        assert_eq!(parsed.settings["Required"], SettingValue::Boolean(false));
        assert!(parsed.warnings.is_empty());

        assert_eq!(parse_settings("   \n\n  "), ParsedSettings::default());
    }

    #[test]
    fn test_render_then_parse_is_stable() {
        let first = parse_settings(COM_OUTPUT).settings;
        let second = parse_settings(&render_settings(&first)).settings;
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_bool_literals() {
        for t in ["1", "t", "T", "true", "TRUE", "True"] {
            assert_eq!(parse_bool(t), Some(true));
        }
        for f in ["0", "f", "F", "false", "FALSE", "False"] {
            assert_eq!(parse_bool(f), Some(false));
        }
        assert_eq!(parse_bool("yes"), None);
    }
}
