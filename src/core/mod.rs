// Core collection logic: records, parsing, providers, collector, sinks

pub mod collector;
pub mod config;
pub mod providers;
pub mod records;
pub mod settings;
pub mod sink;

// Re-export commonly used items
pub use collector::{Category, CollectorConfig, ErrorPolicy, GatherReport, OsInfoCollector};
pub use config::{Config, OutputFormat};
pub use providers::{OsInfoProvider, RegistryProvider, ShellProvider, Strategy};
pub use records::{FieldValue, Measurement, MetricRecord};
pub use settings::{parse_settings, render_settings, SettingValue, UpdateSettings};
pub use sink::{JsonSink, LineProtocolSink, MemorySink, MetricsSink};
