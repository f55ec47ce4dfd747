//! Safetensors weight loading.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use safetensors::SafeTensors;
use tracing::debug;

/// Reads a safetensors file onto `device` and wraps it in a `VarBuilder`.
///
/// The whole file is read into memory; no memory mapping is used.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid safetensors or
/// holds a tensor of an unsupported dtype.
pub fn load_safetensors(path: impl AsRef<Path>, device: &Device) -> Result<VarBuilder<'static>> {
    let path = path.as_ref();
    debug!("Loading weights from {}", path.display());

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read weights file: {}", path.display()))?;
    let file = SafeTensors::deserialize(&bytes)
        .with_context(|| format!("Failed to parse safetensors: {}", path.display()))?;

    let tensors = file
        .tensors()
        .into_iter()
        .map(|(name, view)| {
            let dtype = candle_dtype(view.dtype())
                .with_context(|| format!("Tensor '{name}' in {}", path.display()))?;
            let tensor = Tensor::from_raw_buffer(view.data(), dtype, view.shape(), device)
                .with_context(|| format!("Failed to create tensor '{name}'"))?;
            Ok((name, tensor))
        })
        .collect::<Result<HashMap<_, _>>>()?;

    debug!("Loaded {} tensors", tensors.len());
    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}

fn candle_dtype(dtype: safetensors::Dtype) -> Result<DType> {
    use safetensors::Dtype as S;
    Ok(match dtype {
        S::F32 => DType::F32,
        S::F64 => DType::F64,
        S::F16 => DType::F16,
        S::BF16 => DType::BF16,
        S::I64 => DType::I64,
        S::U32 => DType::U32,
        S::U8 => DType::U8,
        other => bail!("unsupported dtype {other:?}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use safetensors::tensor::TensorView;
    use tempfile::NamedTempFile;

    use super::*;

    fn weights_file(name: &str, values: &[f32], shape: Vec<usize>) -> NamedTempFile {
        let view =
            TensorView::new(safetensors::Dtype::F32, shape, bytemuck::cast_slice(values)).unwrap();
        let bytes = safetensors::serialize(HashMap::from([(name.to_string(), view)]), &None).unwrap();

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file
    }

    #[test]
    fn test_load_and_read_back() {
        let file = weights_file("fc.weight", &[1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        let vb = load_safetensors(file.path(), &Device::Cpu).unwrap();

        let weight = vb.pp("fc").get((2, 2), "weight").unwrap();
        assert_eq!(weight.to_vec2::<f32>().unwrap(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_missing_file_errors() {
        let err = load_safetensors("/nonexistent/weights.safetensors", &Device::Cpu)
            .err()
            .unwrap();
        assert!(err.to_string().contains("Failed to read weights file"));
    }

    #[test]
    fn test_garbage_file_errors() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not safetensors").unwrap();
        assert!(load_safetensors(file.path(), &Device::Cpu).is_err());
    }
}
