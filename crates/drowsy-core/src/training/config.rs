//! Training hyperparameters.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Hyperparameters for a training run.
///
/// The defaults are the reference settings: 50 epochs of Adam at learning
/// rate 0.001 with weight decay 0.01 and batches of 32.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Passes over the training set.
    pub epochs: usize,
    /// Samples per optimizer step.
    pub batch_size: usize,
    /// Adam learning rate.
    pub learning_rate: f64,
    /// L2 penalty added to every gradient.
    pub weight_decay: f64,
    /// Seed for the per-epoch shuffle.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 32,
            learning_rate: 0.001,
            weight_decay: 0.01,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    /// Checks that the values can drive a training run.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.epochs > 0, "epochs must be at least 1");
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        ensure!(
            self.learning_rate > 0.0 && self.learning_rate.is_finite(),
            "learning_rate must be positive, got {}",
            self.learning_rate
        );
        ensure!(
            self.weight_decay >= 0.0 && self.weight_decay.is_finite(),
            "weight_decay must be non-negative, got {}",
            self.weight_decay
        );
        Ok(())
    }
}
