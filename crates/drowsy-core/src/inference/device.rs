//! Compute device selection.

use candle_core::Device;
use tracing::info;

/// Returns the first usable accelerator, falling back to CPU.
///
/// Metal and CUDA are only tried when the matching cargo feature is enabled.
#[must_use]
pub fn get_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            info!("Using Metal device");
            return device;
        }
    }

    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Using CUDA device");
            return device;
        }
    }

    info!("Using CPU device");
    Device::Cpu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_device_without_features_is_cpu() {
        let device = get_device();
        if cfg!(not(any(feature = "metal", feature = "cuda"))) {
            assert!(device.is_cpu());
        }
    }
}
