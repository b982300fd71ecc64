// Platform access: the registry and the script interpreter

pub mod registry;
pub mod shell;

// Re-exports for cleaner imports
pub use registry::{AccessMode, KeyValueStore, MemoryRegistry, RegistryKey, RootKey, WindowsRegistry};
pub use shell::{CommandRunner, PowerShell};
