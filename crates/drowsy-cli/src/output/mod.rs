//! Output formatting for CLI.

mod json;
mod progress;
mod table;

pub use json::{iso_timestamp, FeatureRecord, JsonOutput, TrainingReport};
pub use progress::EpochProgress;
pub use table::print_summary;
