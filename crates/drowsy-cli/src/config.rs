//! Configuration file support for drowsy.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/drowsy/config.toml` (lowest priority)
//! - Project-local: `.drowsy.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Training hyperparameters.
    pub training: TrainingSection,
    /// Dataset handling.
    pub dataset: DatasetSection,
    /// Model settings.
    pub models: ModelsSection,
    /// Output formatting settings.
    pub output: OutputSection,
}

/// `[training]` section.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct TrainingSection {
    /// Passes over the training set.
    pub epochs: Option<usize>,
    /// Samples per optimizer step.
    pub batch_size: Option<usize>,
    /// Adam learning rate.
    pub learning_rate: Option<f64>,
    /// L2 weight decay.
    pub weight_decay: Option<f64>,
    /// Seed for the split and the per-epoch shuffle.
    pub seed: Option<u64>,
    /// Fraction of samples held out for evaluation.
    pub test_fraction: Option<f64>,
}

/// `[dataset]` section.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetSection {
    /// Memoize landmark results per image path.
    pub cache_features: Option<bool>,
}

/// `[models]` section.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsSection {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
}

/// `[output]` section.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Missing files are silently ignored. Unreadable files and invalid
    /// values are reported as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Check configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        let t = &self.training;
        if t.epochs == Some(0) {
            return Err("training.epochs must be at least 1".into());
        }
        if t.batch_size == Some(0) {
            return Err("training.batch_size must be at least 1".into());
        }
        if let Some(lr) = t.learning_rate {
            if lr <= 0.0 || !lr.is_finite() {
                return Err(format!("training.learning_rate must be positive, got {lr}"));
            }
        }
        if let Some(wd) = t.weight_decay {
            if wd < 0.0 || !wd.is_finite() {
                return Err(format!("training.weight_decay must be non-negative, got {wd}"));
            }
        }
        if let Some(f) = t.test_fraction {
            if f <= 0.0 || f >= 1.0 {
                return Err(format!("training.test_fraction must be between 0 and 1, got {f}"));
            }
        }
        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        let t = &mut self.training;
        t.epochs = other.training.epochs.or(t.epochs);
        t.batch_size = other.training.batch_size.or(t.batch_size);
        t.learning_rate = other.training.learning_rate.or(t.learning_rate);
        t.weight_decay = other.training.weight_decay.or(t.weight_decay);
        t.seed = other.training.seed.or(t.seed);
        t.test_fraction = other.training.test_fraction.or(t.test_fraction);

        self.dataset.cache_features = other.dataset.cache_features.or(self.dataset.cache_features);

        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());

        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("drowsy").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.drowsy.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(".drowsy.toml"))
        .find(|path| path.is_file())
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: AppConfig = toml::from_str("").expect("parse empty config");
        assert!(config.training.epochs.is_none());
        assert!(config.models.dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[training]
epochs = 10
batch_size = 16
learning_rate = 0.0005
weight_decay = 0.0
seed = 7
test_fraction = 0.25

[dataset]
cache_features = true

[models]
dir = '/opt/drowsy/models'

[output]
pretty = true
progress = false
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.training.epochs, Some(10));
        assert_eq!(config.training.batch_size, Some(16));
        assert_eq!(config.training.learning_rate, Some(0.0005));
        assert_eq!(config.training.weight_decay, Some(0.0));
        assert_eq!(config.training.seed, Some(7));
        assert_eq!(config.training.test_fraction, Some(0.25));
        assert_eq!(config.dataset.cache_features, Some(true));
        assert_eq!(config.models.dir, Some(PathBuf::from("/opt/drowsy/models")));
        assert_eq!(config.output.pretty, Some(true));
        assert_eq!(config.output.progress, Some(false));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_override_wins_and_base_survives() {
        let mut base: AppConfig = toml::from_str(
            r"
[training]
epochs = 5
seed = 1

[output]
pretty = true
",
        )
        .expect("parse base");

        let project: AppConfig = toml::from_str(
            r"
[training]
epochs = 20

[models]
dir = 'weights'
",
        )
        .expect("parse override");

        base.merge(project);

        assert_eq!(base.training.epochs, Some(20));
        assert_eq!(base.training.seed, Some(1));
        assert_eq!(base.output.pretty, Some(true));
        assert_eq!(base.models.dir, Some(PathBuf::from("weights")));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str("[dataset]\ncache_features = true\n").unwrap();
        base.merge(AppConfig::default());
        assert_eq!(base.dataset.cache_features, Some(true));
    }

    #[test]
    fn test_invalid_field_type_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[training]\nepochs = 'many'\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let cases = [
            ("[training]\nepochs = 0\n", "training.epochs"),
            ("[training]\nbatch_size = 0\n", "training.batch_size"),
            ("[training]\nlearning_rate = -0.1\n", "training.learning_rate"),
            ("[training]\nweight_decay = -1.0\n", "training.weight_decay"),
            ("[training]\ntest_fraction = 1.0\n", "training.test_fraction"),
        ];
        for (toml, field) in cases {
            let config: AppConfig = toml::from_str(toml).unwrap();
            let err = config.validate().unwrap_err();
            assert!(err.contains(field), "{err} should mention {field}");
        }
    }

    #[test]
    fn test_find_config_in_parents() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        // A config above the temp dir may exist on the host; it must not be ours
        assert!(find_config_in_parents(&nested).map_or(true, |p| !p.starts_with(root.path())));

        std::fs::write(root.path().join(".drowsy.toml"), "").unwrap();
        assert_eq!(
            find_config_in_parents(&nested),
            Some(root.path().join(".drowsy.toml"))
        );
    }
}
