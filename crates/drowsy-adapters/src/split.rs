//! Seeded train/test split.

use anyhow::{ensure, Result};
use drowsy_core::domain::Sample;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

/// Shuffles `samples` with `seed` and splits off `ceil(n * test_fraction)` test samples.
///
/// Returns `(train, test)`. The same seed and input always give the same split.
///
/// # Errors
///
/// Returns an error if `test_fraction` is not strictly between 0 and 1 or the
/// training side would be empty.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn train_test_split(
    samples: Vec<Sample>,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<Sample>, Vec<Sample>)> {
    ensure!(
        test_fraction > 0.0 && test_fraction < 1.0,
        "test fraction must be between 0 and 1, got {test_fraction}"
    );

    let n = samples.len();
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    ensure!(
        n_test < n,
        "cannot split {n} samples with test fraction {test_fraction}: the training set would be empty"
    );

    let mut shuffled = samples;
    shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = shuffled.split_off(n_test);
    debug!("Split {n} samples into {} train / {n_test} test", train.len());

    Ok((train, shuffled))
}
