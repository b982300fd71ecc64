use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use colored::*;

use win_os_info::commands;

fn cli() -> Command {
    Command::new("win-os-info")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Collect Windows version and update information as metrics")
        .long_about(
            "Collect Windows version and update information as metrics\n\n\
             Values are read from the registry (default) or queried through PowerShell,\n\
             and written to stdout as InfluxDB line protocol or JSON lines.",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Config file (defaults to <config dir>/win-os-info/config.json)")
                .global(true),
        )
        .arg(
            Arg::new("strategy")
                .short('s')
                .long("strategy")
                .value_name("STRATEGY")
                .help("Where to read values from: registry or shell")
                .value_parser(["registry", "shell"])
                .global(true),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format: line or json")
                .value_parser(["line", "json"])
                .global(true),
        )
        .arg(
            Arg::new("interpreter")
                .long("interpreter")
                .value_name("PROGRAM")
                .help("Interpreter for the shell strategy (defaults to powershell.exe)")
                .global(true),
        )
        .subcommand(Command::new("gather").about("Collect once and print the records"))
        .subcommand(
            Command::new("run")
                .about("Collect repeatedly until interrupted")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("DURATION")
                        .help("Time between collections, e.g. 20s, 5m, 1h"),
                ),
        )
        .subcommand(
            Command::new("sample-config")
                .about("Print a config file with all defaults")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("PATH")
                        .help("Write the sample to PATH instead of stdout"),
                )
                .arg(
                    Arg::new("quiet")
                        .short('q')
                        .long("quiet")
                        .help("Do not print the description")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}

fn run() -> Result<()> {
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("gather", sub_matches)) => commands::gather(sub_matches),
        Some(("run", sub_matches)) => commands::run(sub_matches),
        Some(("sample-config", sub_matches)) => commands::sample_config(sub_matches),
        Some(("version", _)) => commands::version(),
        _ => {
            eprintln!("Use 'win-os-info --help' for more information.");
            Ok(())
        }
    }
}

fn main() {
    win_os_info::init_logging();

    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
