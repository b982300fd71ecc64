use std::path::Path;

use anyhow::Result;
use clap::ArgMatches;
use colored::Colorize;

use crate::core::config::Config;

/// What each category emits, printed with the sample config
pub const DESCRIPTION: &str = "\
Sends information about the Windows system:
  os_version       product name, build and version (registry) or
                   major/minor/build and caption (shell)
  update_history   last successful detect/download/install and time zone (registry) or
                   last installation and last search dates (shell)
  update_settings  AUOptions, IncludeRecommendedUpdates, ElevateNonAdmins,
                   NextDetectionTime (registry) or the AutoUpdate settings object (shell)";

/// Print (or write) a config file with every default filled in
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = Config::default();

    match matches.get_one::<String>("output") {
        Some(path) => {
            config.save_to(Path::new(path))?;
            println!("{} {}", "Sample config written to".green(), path);
        }
        None => {
            if !matches.get_flag("quiet") {
                eprintln!("{}\n", DESCRIPTION.dimmed());
            }
            println!("{}", config.sample());
        }
    }

    Ok(())
}
