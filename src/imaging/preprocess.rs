//! Conversion of an RGB region into the model's normalized input tensor.

use crate::constants::{MODEL_INPUT_CHANNELS, MODEL_INPUT_SIZE, imagenet};
use crate::error::{Error, Result};
use image::{RgbImage, imageops::FilterType};

/// A normalized, channel-planar model input of shape `[1, 3, 256, 256]`.
///
/// Values are stored as the full R plane, then the full G plane, then the
/// full B plane, each row-major. Every value is
/// `(pixel / 255 - mean[c]) / std[c]` with the ImageNet statistics from
/// [`imagenet`]. This layout and normalization are a hard contract with the
/// model; they must match the preprocessing the model was trained with
/// bit for bit.
#[derive(Debug, Clone)]
pub struct InputTensor {
    data: Vec<f32>,
}

impl InputTensor {
    /// Tensor shape as `[batch, channels, height, width]`.
    pub const SHAPE: [usize; 4] = [
        1,
        MODEL_INPUT_CHANNELS,
        MODEL_INPUT_SIZE as usize,
        MODEL_INPUT_SIZE as usize,
    ];

    /// Total number of values.
    pub const LEN: usize = MODEL_INPUT_CHANNELS
        * (MODEL_INPUT_SIZE as usize)
        * (MODEL_INPUT_SIZE as usize);

    /// The contiguous planar buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Tensor shape as i64 dims, the form ONNX Runtime expects.
    #[allow(clippy::cast_possible_wrap)]
    pub fn dims() -> [i64; 4] {
        Self::SHAPE.map(|d| d as i64)
    }
}

/// Normalize a region that is already exactly the model input size.
///
/// # Errors
///
/// [`Error::InputSizeMismatch`] if the region is not 256x256; callers with
/// arbitrary regions should use [`prepare_region`] instead.
pub fn normalize_region(region: &RgbImage) -> Result<InputTensor> {
    let (width, height) = region.dimensions();
    if width != MODEL_INPUT_SIZE || height != MODEL_INPUT_SIZE {
        return Err(Error::InputSizeMismatch {
            width,
            height,
            expected: MODEL_INPUT_SIZE,
        });
    }

    let plane = (MODEL_INPUT_SIZE as usize) * (MODEL_INPUT_SIZE as usize);
    let mut data = vec![0.0f32; InputTensor::LEN];
    let raw = region.as_raw();

    for channel in 0..MODEL_INPUT_CHANNELS {
        let mean = imagenet::MEAN[channel];
        let std = imagenet::STD[channel];
        let out = &mut data[channel * plane..(channel + 1) * plane];
        for (i, value) in out.iter_mut().enumerate() {
            let v = f32::from(raw[i * MODEL_INPUT_CHANNELS + channel]) / 255.0;
            *value = (v - mean) / std;
        }
    }

    Ok(InputTensor { data })
}

/// Resize an arbitrary region to the model input size and normalize it.
///
/// Uses 2D bilinear resampling, matching the resize the model saw in
/// training. Regions already at the input size skip the resize.
pub fn prepare_region(region: &RgbImage) -> Result<InputTensor> {
    let (width, height) = region.dimensions();
    if width == MODEL_INPUT_SIZE && height == MODEL_INPUT_SIZE {
        return normalize_region(region);
    }

    let resized = image::imageops::resize(
        region,
        MODEL_INPUT_SIZE,
        MODEL_INPUT_SIZE,
        FilterType::Triangle,
    );
    normalize_region(&resized)
}
