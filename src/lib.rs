// win-os-info library - public API

// Re-export error types
pub mod error;
pub use error::{Result, WinOsError};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;

// Re-export commonly used types
pub use core::config::Config;
pub use core::{MetricsSink, OsInfoCollector, OsInfoProvider};

// Initialize logging
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
