//! Typed reads from a registry-like key/value store.
//!
//! [`KeyValueStore`] opens a key below one of the predefined roots and hands
//! back a [`RegistryKey`] that reads string and integer values by name.
//! Two stores exist: [`WindowsRegistry`] (Windows only, backed by `winreg`)
//! and [`MemoryRegistry`], which works everywhere and is what the tests use.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{Result, WinOsError};

/// Predefined registry roots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RootKey {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
    Users,
    CurrentConfig,
    PerformanceData,
}

impl RootKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RootKey::ClassesRoot => "HKEY_CLASSES_ROOT",
            RootKey::CurrentUser => "HKEY_CURRENT_USER",
            RootKey::LocalMachine => "HKEY_LOCAL_MACHINE",
            RootKey::Users => "HKEY_USERS",
            RootKey::CurrentConfig => "HKEY_CURRENT_CONFIG",
            RootKey::PerformanceData => "HKEY_PERFORMANCE_DATA",
        }
    }

    /// Full display path of `path` below this root
    pub fn join(&self, path: &str) -> String {
        format!("{}\\{}", self.as_str(), path)
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rights requested when opening a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Query values only
    #[default]
    QueryValue,
    /// Generic read (query, enumerate, notify)
    Read,
}

/// An opened key
pub trait RegistryKey {
    /// `ROOT\path` of this key, used in diagnostics
    fn location(&self) -> &str;

    /// Read a `REG_SZ`/`REG_EXPAND_SZ` value
    fn read_string(&self, name: &str) -> Result<String>;

    /// Read a `REG_DWORD`/`REG_QWORD` value
    fn read_integer(&self, name: &str) -> Result<u64>;
}

/// A store that can open keys by root and path
pub trait KeyValueStore {
    type Key: RegistryKey;

    fn open(&self, root: RootKey, path: &str, access: AccessMode) -> Result<Self::Key>;
}

/// Open `root\path` and read one string value, logging the failing location
pub fn read_string_value<S: KeyValueStore>(
    store: &S,
    root: RootKey,
    path: &str,
    name: &str,
) -> Result<String> {
    let key = store
        .open(root, path, AccessMode::QueryValue)
        .inspect_err(|e| log::warn!("Error while accessing registry key {}: {}", root.join(path), e))?;
    key.read_string(name)
        .inspect_err(|e| log::warn!("Error while obtaining value {}: {}", name, e))
}

// In-memory store

/// A value held by [`MemoryRegistry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryValue {
    Integer(u64),
    String(String),
}

impl From<&str> for RegistryValue {
    fn from(value: &str) -> Self {
        RegistryValue::String(value.to_string())
    }
}

impl From<String> for RegistryValue {
    fn from(value: String) -> Self {
        RegistryValue::String(value)
    }
}

impl From<u64> for RegistryValue {
    fn from(value: u64) -> Self {
        RegistryValue::Integer(value)
    }
}

impl From<u32> for RegistryValue {
    fn from(value: u32) -> Self {
        RegistryValue::Integer(u64::from(value))
    }
}

/// Registry held in memory. Key paths compare case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    keys: BTreeMap<(RootKey, String), BTreeMap<String, RegistryValue>>,
    denied: BTreeSet<(RootKey, String)>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(path: &str) -> String {
        path.trim_matches('\\').to_ascii_lowercase()
    }

    /// Create `root\path` if needed and set `name` on it
    pub fn set_value<V: Into<RegistryValue>>(&mut self, root: RootKey, path: &str, name: &str, value: V) {
        self.keys
            .entry((root, Self::normalize(path)))
            .or_default()
            .insert(name.to_string(), value.into());
    }

    /// Builder form of [`set_value`](Self::set_value)
    pub fn with_value<V: Into<RegistryValue>>(mut self, root: RootKey, path: &str, name: &str, value: V) -> Self {
        self.set_value(root, path, name, value);
        self
    }

    /// Create an empty key
    pub fn create_key(&mut self, root: RootKey, path: &str) {
        self.keys.entry((root, Self::normalize(path))).or_default();
    }

    /// Make opening `root\path` fail with access denied
    pub fn deny(&mut self, root: RootKey, path: &str) {
        self.denied.insert((root, Self::normalize(path)));
    }
}

/// Key opened from a [`MemoryRegistry`]
#[derive(Debug, Clone)]
pub struct MemoryKey {
    location: String,
    values: BTreeMap<String, RegistryValue>,
}

impl RegistryKey for MemoryKey {
    fn location(&self) -> &str {
        &self.location
    }

    fn read_string(&self, name: &str) -> Result<String> {
        match self.values.get(name) {
            Some(RegistryValue::String(s)) => Ok(s.clone()),
            Some(RegistryValue::Integer(_)) => {
                Err(WinOsError::type_mismatch(&self.location, name, "a string"))
            }
            None => Err(WinOsError::value_not_found(&self.location, name)),
        }
    }

    fn read_integer(&self, name: &str) -> Result<u64> {
        match self.values.get(name) {
            Some(RegistryValue::Integer(n)) => Ok(*n),
            Some(RegistryValue::String(_)) => {
                Err(WinOsError::type_mismatch(&self.location, name, "an integer"))
            }
            None => Err(WinOsError::value_not_found(&self.location, name)),
        }
    }
}

impl KeyValueStore for MemoryRegistry {
    type Key = MemoryKey;

    fn open(&self, root: RootKey, path: &str, _access: AccessMode) -> Result<MemoryKey> {
        let normalized = (root, Self::normalize(path));
        let location = root.join(path);

        if self.denied.contains(&normalized) {
            return Err(WinOsError::access_denied(location));
        }

        match self.keys.get(&normalized) {
            Some(values) => Ok(MemoryKey {
                location,
                values: values.clone(),
            }),
            None => Err(WinOsError::key_not_found(location)),
        }
    }
}

// Windows registry

/// The live Windows registry
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsRegistry;

impl WindowsRegistry {
    pub fn new() -> Self {
        WindowsRegistry
    }
}

#[cfg(windows)]
mod windows_impl {
    use std::io;

    use winreg::enums::*;
    use winreg::RegKey;

    use super::{AccessMode, KeyValueStore, RegistryKey, RootKey, WindowsRegistry};
    use crate::error::{Result, WinOsError};

    fn predef(root: RootKey) -> RegKey {
        RegKey::predef(match root {
            RootKey::ClassesRoot => HKEY_CLASSES_ROOT,
            RootKey::CurrentUser => HKEY_CURRENT_USER,
            RootKey::LocalMachine => HKEY_LOCAL_MACHINE,
            RootKey::Users => HKEY_USERS,
            RootKey::CurrentConfig => HKEY_CURRENT_CONFIG,
            RootKey::PerformanceData => HKEY_PERFORMANCE_DATA,
        })
    }

    /// Key opened from the Windows registry
    pub struct WindowsKey {
        location: String,
        key: RegKey,
    }

    impl WindowsKey {
        fn read_error(&self, name: &str, err: io::Error, expected: &'static str) -> WinOsError {
            match err.kind() {
                io::ErrorKind::NotFound => WinOsError::value_not_found(&self.location, name),
                io::ErrorKind::PermissionDenied => WinOsError::access_denied(&self.location),
                _ => WinOsError::type_mismatch(&self.location, name, expected),
            }
        }
    }

    impl RegistryKey for WindowsKey {
        fn location(&self) -> &str {
            &self.location
        }

        fn read_string(&self, name: &str) -> Result<String> {
            self.key
                .get_value::<String, _>(name)
                .map_err(|e| self.read_error(name, e, "a string"))
        }

        fn read_integer(&self, name: &str) -> Result<u64> {
            match self.key.get_value::<u32, _>(name) {
                Ok(n) => Ok(u64::from(n)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    Err(WinOsError::value_not_found(&self.location, name))
                }
                // Not a DWORD; QWORD is the other integer type
                Err(_) => self
                    .key
                    .get_value::<u64, _>(name)
                    .map_err(|e| self.read_error(name, e, "an integer")),
            }
        }
    }

    impl KeyValueStore for WindowsRegistry {
        type Key = WindowsKey;

        fn open(&self, root: RootKey, path: &str, access: AccessMode) -> Result<WindowsKey> {
            let flags = match access {
                AccessMode::QueryValue => KEY_QUERY_VALUE,
                AccessMode::Read => KEY_READ,
            };
            let location = root.join(path);

            let key = predef(root)
                .open_subkey_with_flags(path, flags)
                .map_err(|e| match e.kind() {
                    io::ErrorKind::PermissionDenied => WinOsError::access_denied(&location),
                    _ => WinOsError::key_not_found(&location),
                })?;

            Ok(WindowsKey { location, key })
        }
    }
}

#[cfg(windows)]
pub use windows_impl::WindowsKey;

#[cfg(not(windows))]
impl KeyValueStore for WindowsRegistry {
    type Key = MemoryKey;

    fn open(&self, root: RootKey, path: &str, _access: AccessMode) -> Result<MemoryKey> {
        Err(WinOsError::unsupported(format!(
            "registry key {} can only be read on Windows",
            root.join(path)
        )))
    }
}
