use anyhow::Result;
use clap::ArgMatches;
use log::warn;

use super::{build_collector, load_config, stdout_sink};

/// Collect once and write the records to stdout
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let mut collector = build_collector(&config)?;
    let mut sink = stdout_sink(config.format);

    let report = collector.gather(sink.as_mut())?;

    if report.emitted == 0 && !report.is_clean() {
        warn!("No records were produced");
    }

    Ok(())
}
