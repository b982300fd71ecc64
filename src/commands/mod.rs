// Command handlers module
pub mod gather;
pub mod run;
pub mod sample_config;
pub mod version;

use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use log::info;

use crate::core::config::{Config, OutputFormat};
use crate::core::providers::{OsInfoProvider, RegistryProvider, ShellProvider, Strategy};
use crate::core::sink::{JsonSink, LineProtocolSink, MetricsSink};
use crate::core::OsInfoCollector;
use crate::platform::registry::WindowsRegistry;
use crate::platform::shell::{PowerShell, DEFAULT_INTERPRETER};

// Re-exports for cleaner imports
pub use gather::execute as gather;
pub use run::execute as run;
pub use sample_config::execute as sample_config;
pub use version::execute as version;

/// Load the config file and apply the shared command-line overrides
pub fn load_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(Path::new(path))?,
        None => Config::load()?,
    };

    if let Some(strategy) = matches.get_one::<String>("strategy") {
        config.strategy = strategy.parse()?;
    }
    if let Some(format) = matches.get_one::<String>("format") {
        config.format = format.parse()?;
    }
    if let Some(interpreter) = matches.get_one::<String>("interpreter") {
        config.interpreter = Some(interpreter.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Build the provider for the configured strategy.
///
/// The interpreter is looked up here, once; if it cannot be found the shell
/// strategy is unusable and this fails.
pub fn build_provider(config: &Config) -> Result<Box<dyn OsInfoProvider>> {
    match config.strategy {
        Strategy::Registry => {
            if cfg!(not(windows)) {
                bail!("The registry strategy needs Windows; use --strategy shell with a PowerShell install");
            }
            Ok(Box::new(RegistryProvider::new(WindowsRegistry::new())))
        }
        Strategy::Shell => {
            let program = config.interpreter.as_deref().unwrap_or(DEFAULT_INTERPRETER);
            let runner = PowerShell::locate_program(program)
                .with_context(|| "The shell strategy cannot run without its interpreter")?
                .with_timeout(config.command_timeout()?);
            info!(
                "Using {} for queries, timeout {:?}",
                runner.program().display(),
                runner.timeout()
            );
            Ok(Box::new(ShellProvider::new(runner)))
        }
    }
}

pub fn build_collector(config: &Config) -> Result<OsInfoCollector<Box<dyn OsInfoProvider>>> {
    let provider = build_provider(config)?;
    Ok(OsInfoCollector::with_config(provider, config.collector_config()).with_tags(config.tags.clone()))
}

/// Sink writing the configured format to stdout
pub fn stdout_sink(format: OutputFormat) -> Box<dyn MetricsSink> {
    match format {
        OutputFormat::Line => Box::new(LineProtocolSink::new(io::stdout())),
        OutputFormat::Json => Box::new(JsonSink::new(io::stdout())),
    }
}
