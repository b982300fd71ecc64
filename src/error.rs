use std::io;
use std::time::Duration;
use thiserror::Error;

/// Error type for registry reads, script execution and record building
#[derive(Error, Debug)]
pub enum WinOsError {
    #[error("Registry key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Access denied to registry key: {key}")]
    AccessDenied { key: String },

    #[error("Registry value not found: {key}\\{value}")]
    ValueNotFound { key: String, value: String },

    #[error("Registry value {key}\\{value} is not {expected}")]
    TypeMismatch {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Cannot find script interpreter '{program}': {reason}")]
    InterpreterNotFound { program: String, reason: String },

    #[error("Failed to start '{command}': {source}")]
    ProcessSpawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("'{command}' exited with {}: {stderr}", exit_label(.code))]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("'{command}' did not finish within {after:?}")]
    Timeout { command: String, after: Duration },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Not supported on this platform: {0}")]
    Unsupported(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

/// Result type alias for win-os-info
pub type Result<T> = std::result::Result<T, WinOsError>;

impl WinOsError {
    /// Create a key-not-found error for `key`
    pub fn key_not_found<S: Into<String>>(key: S) -> Self {
        WinOsError::KeyNotFound { key: key.into() }
    }

    /// Create an access-denied error for `key`
    pub fn access_denied<S: Into<String>>(key: S) -> Self {
        WinOsError::AccessDenied { key: key.into() }
    }

    pub fn value_not_found<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        WinOsError::ValueNotFound {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn type_mismatch<K: Into<String>, V: Into<String>>(
        key: K,
        value: V,
        expected: &'static str,
    ) -> Self {
        WinOsError::TypeMismatch {
            key: key.into(),
            value: value.into(),
            expected,
        }
    }

    /// Create a parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        WinOsError::Parse(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        WinOsError::Config(msg.into())
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        WinOsError::Unsupported(msg.into())
    }
}
