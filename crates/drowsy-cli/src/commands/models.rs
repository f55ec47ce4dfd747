//! Models command - inspect the face model weights.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::model_store;
use crate::config::AppConfig;

/// Arguments for the models command
#[derive(Args, Debug, Clone)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,

    /// Directory holding the face model weights
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<PathBuf>,
}

/// Models subcommands
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ModelsCommand {
    /// List expected models and whether they are installed
    List,
    /// Print model directory path
    Path,
}

impl ModelsArgs {
    /// Fill unset arguments from the config file.
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }
        args
    }
}

/// Run the models command.
#[allow(clippy::unnecessary_wraps)]
pub fn run(args: &ModelsArgs) -> Result<()> {
    let store = model_store(args.models_dir.as_ref());
    match args.command {
        ModelsCommand::List => {
            let models = store.list();
            println!("Models directory: {}", store.dir().display());
            println!();

            for status in &models {
                let mark = if status.installed { "✓" } else { "✗" };
                println!("  {mark} {} ({})", status.info.name, status.info.filename);
            }

            println!();
            let installed = models.iter().filter(|s| s.installed).count();
            println!("{installed}/{} models installed", models.len());
        }
        ModelsCommand::Path => println!("{}", store.dir().display()),
    }
    Ok(())
}
