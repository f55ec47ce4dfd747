//! Zero-weight face models.

use std::path::Path;

use anyhow::{Context, Result};
use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use drowsy_core::inference::{BlazeFace, LandmarkNet};

/// Writes `blazeface.safetensors` and `landmarks68.safetensors` into `dir`
/// with every weight set to zero.
///
/// The detector built from these never finds a face, so every image takes
/// the no-face path of the feature pipeline.
///
/// # Errors
///
/// Returns an error if a model cannot be built or a file cannot be written.
pub fn write_zero_models(dir: &Path) -> Result<()> {
    save_zeroed(&dir.join("blazeface.safetensors"), |vb| {
        BlazeFace::new(vb).map(drop)
    })?;
    save_zeroed(&dir.join("landmarks68.safetensors"), |vb| {
        LandmarkNet::new(vb).map(drop)
    })
}

fn save_zeroed(path: &Path, build: impl FnOnce(VarBuilder) -> Result<()>) -> Result<()> {
    let varmap = VarMap::new();
    build(VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu))?;
    for var in varmap.all_vars() {
        var.set(&var.zeros_like()?)?;
    }
    varmap
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use drowsy_core::inference::load_safetensors;
    use drowsy_core::ports::FaceDetector;
    use image::GrayImage;

    use super::*;

    #[test]
    fn test_zero_detector_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_zero_models(dir.path()).unwrap();

        let vb = load_safetensors(dir.path().join("blazeface.safetensors"), &Device::Cpu).unwrap();
        let detector = BlazeFace::new(vb).unwrap();
        assert!(detector.detect(&GrayImage::new(64, 64)).unwrap().is_empty());
        assert!(dir.path().join("landmarks68.safetensors").is_file());
    }
}
