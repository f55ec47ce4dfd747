//! Training and evaluation of the fusion classifier.

mod config;
mod evaluate;
mod loss;
mod optim;
mod train;

pub use config::TrainingConfig;
pub use evaluate::{accuracy, evaluate, ConfusionMatrix, Evaluation, DECISION_THRESHOLD};
pub use loss::binary_cross_entropy;
pub use optim::{Adam, ParamsAdam};
pub use train::{batch_indices, train, TrainingHistory};
