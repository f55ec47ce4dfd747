//! Drowsy CLI - train and evaluate a driver drowsiness classifier.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let result = match cli.command {
        Commands::Train(args) => {
            commands::train::run(&commands::train::TrainArgs::with_config(args, &config))
        }
        Commands::Evaluate(args) => {
            commands::evaluate::run(&commands::evaluate::EvaluateArgs::with_config(args, &config))
        }
        Commands::Features(args) => {
            commands::features::run(&commands::features::FeaturesArgs::with_config(args, &config))
        }
        Commands::Dataset(args) => {
            commands::dataset::run(&commands::dataset::DatasetArgs::with_config(args, &config))
        }
        Commands::Models(args) => {
            commands::models::run(&commands::models::ModelsArgs::with_config(args, &config))
        }
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    };

    exit_code.into()
}
