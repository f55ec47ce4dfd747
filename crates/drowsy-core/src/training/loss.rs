//! Loss functions.

use candle_core::{Result, Tensor};

/// Probabilities are clamped to `[EPS, 1 - EPS]` before taking logs.
const EPS: f64 = 1e-7;

/// Mean binary cross-entropy between probabilities and 0/1 targets.
///
/// # Errors
///
/// Returns an error if the shapes differ.
pub fn binary_cross_entropy(probabilities: &Tensor, targets: &Tensor) -> Result<Tensor> {
    let p = probabilities.clamp(EPS, 1.0 - EPS)?;
    let pos = (targets * p.log()?)?;
    let neg = (targets.affine(-1.0, 1.0)? * p.affine(-1.0, 1.0)?.log()?)?;
    (pos + neg)?.neg()?.mean_all()
}
