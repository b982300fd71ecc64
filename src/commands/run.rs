use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use log::{error, info};

use super::{build_collector, load_config, stdout_sink};

const SLEEP_STEP: Duration = Duration::from_millis(200);

/// Collect every interval until interrupted
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let mut config = load_config(matches)?;
    if let Some(interval) = matches.get_one::<String>("interval") {
        config.interval = interval.clone();
    }
    let interval = config.interval()?;

    let mut collector = build_collector(&config)?;
    let mut sink = stdout_sink(config.format);

    // Create shared cancellation flag
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel_flag_clone = cancel_flag.clone();

    // Setup Ctrl+C handler; stdout carries metrics, so talk on stderr
    ctrlc::set_handler(move || {
        eprintln!("{}", "Stopping after the current collection...".yellow());
        cancel_flag_clone.store(true, Ordering::Relaxed);
    })
    .context("Failed to set Ctrl+C handler")?;

    info!("Collecting every {:?} via {} strategy", interval, config.strategy);

    while !cancel_flag.load(Ordering::Relaxed) {
        let started = Instant::now();

        // A failed tick is logged; the next one still runs
        if let Err(e) = collector.gather(sink.as_mut()) {
            error!("Collection failed: {}", e);
        }

        while !cancel_flag.load(Ordering::Relaxed) && started.elapsed() < interval {
            thread::sleep(SLEEP_STEP.min(interval.saturating_sub(started.elapsed())));
        }
    }

    info!("Stopped");
    Ok(())
}
