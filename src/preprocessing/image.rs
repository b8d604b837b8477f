use crate::error::InferenceError;
use image::{imageops::FilterType, DynamicImage};
use ndarray::{Array, Array4, Axis};
use serde::Deserialize;

// ImageNet Standards
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Memory order of the model input tensor.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TensorLayout {
    /// `[1, H, W, 3]`, as exported from TFLite / Keras.
    #[default]
    Nhwc,
    /// `[1, 3, H, W]`, the usual PyTorch export.
    Nchw,
}

/// How raw 0..=255 channel values are mapped to floats.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// `x / 127.5 - 1`, range [-1, 1].
    #[default]
    SignedUnit,
    /// `(x / 255 - mean) / std` with ImageNet statistics.
    Imagenet,
}

impl Normalization {
    #[inline]
    fn apply(self, value: u8, channel: usize) -> f32 {
        match self {
            Normalization::SignedUnit => value as f32 / 127.5 - 1.0,
            Normalization::Imagenet => ((value as f32 / 255.0) - MEAN[channel]) / STD[channel],
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Side of the square the image is fitted into.
    pub input_size: u32,
    pub layout: TensorLayout,
    pub normalization: Normalization,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            input_size: 224,
            layout: TensorLayout::default(),
            normalization: Normalization::default(),
        }
    }
}

/// Decodes raw image bytes into a batched model input tensor.
///
/// The largest centred square is cropped out of the source, resized to
/// `input_size` and converted to RGB, then normalized. Returns
/// `[1, S, S, 3]` or `[1, 3, S, S]` depending on `config.layout`.
pub fn process_bytes(buffer: &[u8], config: &PreprocessConfig) -> Result<Array4<f32>, InferenceError> {
    let img = image::load_from_memory(buffer)?;
    to_tensor(&img, config)
}

/// Same as [`process_bytes`] for an already decoded image.
pub fn to_tensor(img: &DynamicImage, config: &PreprocessConfig) -> Result<Array4<f32>, InferenceError> {
    let size = config.input_size;
    if size == 0 {
        return Err(InferenceError::PreprocessingError(
            "input_size must be greater than zero".to_string(),
        ));
    }

    let (x, y, side) = centre_square(img.width(), img.height());
    let fitted = img
        .crop_imm(x, y, side, side)
        .resize_exact(size, size, FilterType::Lanczos3);
    let rgb = fitted.to_rgb8();

    let side = size as usize;
    let mut normalized_data = Vec::with_capacity(3 * side * side);
    for pixel in rgb.pixels() {
        for (channel, &value) in pixel.0.iter().enumerate() {
            normalized_data.push(config.normalization.apply(value, channel));
        }
    }

    // Pixels come out row-major as [H, W, C]
    let array = Array::from_shape_vec((side, side, 3), normalized_data)
        .map_err(|e| InferenceError::PreprocessingError(e.to_string()))?;

    let array = match config.layout {
        TensorLayout::Nhwc => array,
        TensorLayout::Nchw => array.permuted_axes([2, 0, 1]),
    };
    let array = array.insert_axis(Axis(0));

    Ok(array.as_standard_layout().to_owned())
}

/// Largest centred square inside a `width` x `height` image, as `(x, y, side)`.
///
/// Cropping happens in source coordinates so the resize never sees more than
/// `side * side` pixels.
fn centre_square(width: u32, height: u32) -> (u32, u32, u32) {
    let side = width.min(height);
    ((width - side) / 2, (height - side) / 2, side)
}
