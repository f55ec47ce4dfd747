//! Model weight store.
//!
//! Weights are not downloaded; they are expected to be placed in the store
//! directory by the user.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use candle_core::Device;
use drowsy_core::inference::{load_safetensors, BlazeFace, LandmarkNet};
use tracing::debug;

/// Model metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Filename in the models directory.
    pub filename: &'static str,
    /// What the model does.
    pub description: &'static str,
}

/// Face detector weights.
pub const BLAZEFACE: ModelInfo = ModelInfo {
    name: "blazeface",
    filename: "blazeface.safetensors",
    description: "BlazeFace face detector",
};

/// Landmark regressor weights.
pub const LANDMARKS68: ModelInfo = ModelInfo {
    name: "landmarks68",
    filename: "landmarks68.safetensors",
    description: "68-point facial landmark regressor",
};

/// Known models.
pub const MODELS: &[ModelInfo] = &[BLAZEFACE, LANDMARKS68];

/// Installation status of one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStatus {
    /// Model metadata.
    pub info: ModelInfo,
    /// Expected location of the weights.
    pub path: PathBuf,
    /// Whether the file exists.
    pub installed: bool,
}

/// Directory holding model weight files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default store location.
    ///
    /// Uses `XDG_DATA_HOME/drowsy/models` or `~/.local/share/drowsy/models`.
    #[must_use]
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drowsy")
            .join("models")
    }

    /// Store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Expected path of a named model, `None` for unknown names.
    #[must_use]
    pub fn path(&self, name: &str) -> Option<PathBuf> {
        MODELS
            .iter()
            .find(|m| m.name == name)
            .map(|m| self.dir.join(m.filename))
    }

    /// Status of every known model.
    #[must_use]
    pub fn list(&self) -> Vec<ModelStatus> {
        MODELS
            .iter()
            .map(|&info| {
                let path = self.dir.join(info.filename);
                let installed = path.is_file();
                ModelStatus {
                    info,
                    path,
                    installed,
                }
            })
            .collect()
    }

    /// Returns true if every known model is present.
    #[must_use]
    pub fn all_installed(&self) -> bool {
        self.list().iter().all(|status| status.installed)
    }

    /// Loads the face detector.
    ///
    /// # Errors
    ///
    /// Returns an error if the weights are missing or invalid.
    pub fn detector(&self, device: &Device) -> Result<BlazeFace> {
        let path = self.require(&BLAZEFACE)?;
        BlazeFace::new(load_safetensors(&path, device)?)
            .with_context(|| format!("Invalid {} weights: {}", BLAZEFACE.name, path.display()))
    }

    /// Loads the landmark predictor.
    ///
    /// # Errors
    ///
    /// Returns an error if the weights are missing or invalid.
    pub fn predictor(&self, device: &Device) -> Result<LandmarkNet> {
        let path = self.require(&LANDMARKS68)?;
        LandmarkNet::new(load_safetensors(&path, device)?)
            .with_context(|| format!("Invalid {} weights: {}", LANDMARKS68.name, path.display()))
    }

    fn require(&self, model: &ModelInfo) -> Result<PathBuf> {
        let path = self.dir.join(model.filename);
        ensure!(
            path.is_file(),
            "{} weights not found at {}. Place {} in {} or pass --models-dir",
            model.description,
            path.display(),
            model.filename,
            self.dir.display()
        );
        debug!("Using {} weights from {}", model.name, path.display());
        Ok(path)
    }
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}
