//! Training progress port for UI integration.

/// Events emitted while training.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    /// An epoch is starting.
    EpochStarted {
        /// Epoch number (1-based).
        epoch: usize,
        /// Total epochs in the run.
        epochs: usize,
        /// Batches in this epoch.
        batches: usize,
    },
    /// One optimizer step finished.
    BatchCompleted {
        /// Epoch number (1-based).
        epoch: usize,
        /// Batch index in the epoch (0-based).
        batch: usize,
        /// Loss of this batch.
        loss: f32,
    },
    /// An epoch finished.
    EpochCompleted {
        /// Epoch number (1-based).
        epoch: usize,
        /// Mean batch loss over the epoch.
        mean_loss: f32,
    },
    /// Training finished.
    Finished {
        /// Epochs run.
        epochs: usize,
        /// Mean loss of the last epoch.
        final_loss: f32,
    },
}

/// Port for receiving training events.
pub trait TrainingProgress: Send + Sync {
    /// Called when a training event occurs.
    fn on_event(&self, event: TrainingEvent);
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl TrainingProgress for NoProgress {
    fn on_event(&self, _event: TrainingEvent) {}
}
