//! Progress bar adapter using indicatif.

use drowsy_core::ports::{TrainingEvent, TrainingProgress};
use indicatif::{ProgressBar, ProgressStyle};

/// Per-epoch progress for the CLI.
///
/// With a bar, each epoch refills it batch by batch. Without one, a single
/// line per finished epoch is written to stderr.
pub struct EpochProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl EpochProgress {
    /// Creates a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, show progress bar; otherwise show per-epoch lines
    #[must_use]
    pub fn new(quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            ) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });

        Self { bar, quiet }
    }
}

impl TrainingProgress for EpochProgress {
    fn on_event(&self, event: TrainingEvent) {
        if self.quiet {
            return;
        }

        match event {
            TrainingEvent::EpochStarted {
                epoch,
                epochs,
                batches,
            } => {
                if let Some(bar) = &self.bar {
                    bar.reset();
                    bar.set_length(batches as u64);
                    bar.set_message(format!("epoch {epoch}/{epochs}"));
                }
            }
            TrainingEvent::BatchCompleted { loss, .. } => {
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                    bar.set_message(format!("loss {loss:.4}"));
                }
            }
            TrainingEvent::EpochCompleted { epoch, mean_loss } => {
                let line = format!("Epoch {epoch}, Loss: {mean_loss:.4}");
                if let Some(bar) = &self.bar {
                    bar.println(line);
                } else {
                    eprintln!("{line}");
                }
            }
            TrainingEvent::Finished { epochs, final_loss } => {
                if let Some(bar) = &self.bar {
                    bar.finish_with_message(format!(
                        "Done: {epochs} epochs, final loss {final_loss:.4}"
                    ));
                }
            }
        }
    }
}
