use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::providers::OsInfoProvider;
use super::records::{Measurement, MetricRecord, Tags};
use super::sink::MetricsSink;
use crate::error::{Result, WinOsError};

/// What a tick does when one category fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the failure and go on with the next category
    #[default]
    Continue,
    /// Stop the tick at the first failure and return it
    FailFast,
}

/// Metric categories, in collection order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Version,
    UpdateHistory,
    UpdateSettings,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Version => "version",
            Category::UpdateHistory => "update history",
            Category::UpdateSettings => "update settings",
        })
    }
}

/// Configuration for a collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    pub os_version: bool,
    pub update_history: bool,
    pub update_settings: bool,
    pub error_policy: ErrorPolicy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            os_version: true,
            update_history: true,
            update_settings: true,
            error_policy: ErrorPolicy::Continue,
        }
    }
}

impl CollectorConfig {
    pub fn enabled(&self) -> Vec<Category> {
        let mut categories = Vec::with_capacity(3);
        if self.os_version {
            categories.push(Category::Version);
        }
        if self.update_history {
            categories.push(Category::UpdateHistory);
        }
        if self.update_settings {
            categories.push(Category::UpdateSettings);
        }
        categories
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Idle,
    Collecting,
}

/// Outcome of one tick
#[derive(Debug, Default)]
pub struct GatherReport {
    pub emitted: usize,
    pub failures: Vec<(Category, WinOsError)>,
}

impl GatherReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Gathers OS information from a provider and forwards it to a sink
pub struct OsInfoCollector<P> {
    provider: P,
    config: CollectorConfig,
    tags: Tags,
    state: CollectorState,
}

impl<P: OsInfoProvider> OsInfoCollector<P> {
    /// Create a collector with default configuration
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, CollectorConfig::default())
    }

    pub fn with_config(provider: P, config: CollectorConfig) -> Self {
        Self {
            provider,
            config,
            tags: Tags::new(),
            state: CollectorState::Idle,
        }
    }

    /// Tags attached to every record; empty unless set
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    /// Build the record for one category
    pub fn collect(&self, category: Category) -> Result<MetricRecord> {
        let record = match category {
            Category::Version => self.provider.read_version()?.to_record(&self.tags),
            Category::UpdateHistory => self.provider.read_update_history()?.to_record(&self.tags),
            Category::UpdateSettings => self.provider.read_update_settings()?.to_record(&self.tags),
        };
        Ok(record)
    }

    /// Run one collection pass over every enabled category
    pub fn gather(&mut self, sink: &mut dyn MetricsSink) -> Result<GatherReport> {
        self.state = CollectorState::Collecting;
        let result = self.gather_enabled(sink);
        self.state = CollectorState::Idle;

        if let Ok(report) = &result {
            info!(
                "Gathered {} record(s) via {}, {} failure(s)",
                report.emitted,
                self.provider.strategy(),
                report.failures.len()
            );
        }
        result
    }

    fn gather_enabled(&self, sink: &mut dyn MetricsSink) -> Result<GatherReport> {
        let mut report = GatherReport::default();

        for category in self.config.enabled() {
            match self.collect(category) {
                Ok(record) => {
                    debug!("Emitting {} ({} fields)", record.measurement, record.fields.len());
                    sink.add_record(&record);
                    report.emitted += 1;
                }
                Err(e) => match self.config.error_policy {
                    ErrorPolicy::FailFast => {
                        warn!("Collecting {} failed, stopping: {}", category, e);
                        return Err(e);
                    }
                    ErrorPolicy::Continue => {
                        warn!("Collecting {} failed: {}", category, e);
                        report.failures.push((category, e));
                    }
                },
            }
        }

        Ok(report)
    }
}
