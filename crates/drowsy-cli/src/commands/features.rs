//! Features command - print landmark features per image.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use drowsy_adapters::collect_images;
use drowsy_core::inference::get_device;
use tracing::{info, warn};

use super::{build_pipeline, model_store};
use crate::config::AppConfig;
use crate::output::{FeatureRecord, JsonOutput};

/// Arguments for the features command.
#[derive(Args, Debug, Clone)]
pub struct FeaturesArgs {
    /// Image files or directories to process
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Directory holding the face model weights
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,
}

impl FeaturesArgs {
    /// Fill unset arguments from the config file.
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }
        args
    }
}

/// Run the features command.
///
/// Images that fail to load are skipped with a warning.
pub fn run(args: &FeaturesArgs) -> Result<()> {
    let images = collect_images(&args.paths);
    if images.is_empty() {
        bail!("No supported images found");
    }

    let device = get_device();
    let pipeline = build_pipeline(&model_store(args.models_dir.as_ref()), &device, false)?;
    let output = JsonOutput::stdout();

    let mut skipped = 0usize;
    for path in &images {
        match pipeline.features_for(path) {
            Ok(features) => output.write_line(&FeatureRecord::new(path, features))?,
            Err(e) => {
                warn!("Skipping {}: {e:#}", path.display());
                skipped += 1;
            }
        }
    }

    info!("Processed {} images, skipped {skipped}", images.len() - skipped);
    Ok(())
}
