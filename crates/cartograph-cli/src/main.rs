use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use cartograph_cli::{
    Args,
    error_adapter::{render, to_reportables},
};

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Cartograph");
    debug!(args:?; "Parsed arguments");

    if let Err(err) = cartograph_cli::run(&args) {
        let reports: Vec<String> = to_reportables(&err)
            .iter()
            .map(|reportable| render(reportable))
            .collect();

        error!("Failed\n{}", reports.join("\n"));
        process::exit(1);
    }

    info!("Completed successfully");
}
