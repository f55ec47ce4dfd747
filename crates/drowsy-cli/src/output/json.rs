//! JSON output adapter.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use drowsy_core::{ConfusionMatrix, FeatureVector, TrainingConfig};
use serde::Serialize;
use tracing::debug;

/// Summary of a training run, written with `--report`.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    /// RFC 3339 UTC time the report was produced.
    pub timestamp: String,
    /// Dataset root.
    pub dataset: PathBuf,
    /// Hyperparameters used.
    pub hyperparameters: TrainingConfig,
    /// Fraction of samples held out.
    pub test_fraction: f64,
    /// Samples used for training.
    pub train_samples: usize,
    /// Samples used for evaluation.
    pub test_samples: usize,
    /// Mean loss per epoch.
    pub epoch_losses: Vec<f32>,
    /// Test accuracy in `[0, 1]`.
    pub accuracy: f64,
    /// Test confusion matrix.
    pub confusion_matrix: ConfusionMatrix,
}

/// One line of `drowsy features` output.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureRecord {
    /// Image path as given.
    pub path: String,
    /// Whether the detector found a face.
    pub face_found: bool,
    /// Left eye aspect ratio.
    pub ear_left: f32,
    /// Right eye aspect ratio.
    pub ear_right: f32,
    /// Mouth opening ratio.
    pub mouth_opening_ratio: f32,
    /// Nose length over nose-tip to chin distance.
    pub nose_length_ratio: f32,
}

impl FeatureRecord {
    /// Builds a record, using the zero vector when no face was found.
    #[must_use]
    pub fn new(path: &Path, features: Option<FeatureVector>) -> Self {
        let v = features.unwrap_or(FeatureVector::NO_FACE);
        Self {
            path: path.to_string_lossy().into_owned(),
            face_found: features.is_some(),
            ear_left: v.ear_left(),
            ear_right: v.ear_right(),
            mouth_opening_ratio: v.mouth_opening(),
            nose_length_ratio: v.nose_length(),
        }
    }
}

/// JSON writer over stdout, a file or any other sink.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Creates (or truncates) `path` and writes to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        debug!("Writing JSON to {}", path.display());
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes one value as a single line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_line<T: Serialize>(&self, value: &T) -> Result<()> {
        self.write_value(value, false)
    }

    /// Writes one value, optionally pretty-printed, and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails, or the writer
    /// lock is poisoned.
    #[allow(clippy::significant_drop_tightening)]
    pub fn write_value<T: Serialize>(&self, value: &T, pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        writer.flush()?;
        Ok(())
    }
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
pub fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
