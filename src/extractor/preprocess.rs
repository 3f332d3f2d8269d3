use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use ndarray::{Array3, Array4, Axis};

use crate::error::CategorizeError;
use crate::models::InputNormalization;

/// Decodes one image and converts it to a `[3, size, size]` f32 array in RGB
/// channel order, pixel values scaled to [0, 1] and normalized with the
/// backbone's per-channel statistics.
pub(crate) fn load_image_chw(
    path: &Path,
    size: u32,
    norm: &InputNormalization,
) -> Result<Array3<f32>, CategorizeError> {
    let img = image::open(path).map_err(|e| CategorizeError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let img = img.resize_exact(size, size, FilterType::Triangle).to_rgb8();

    let side = size as usize;
    let mut chw = Array3::<f32>::zeros((3, side, side));
    for (x, y, pixel) in img.enumerate_pixels() {
        for (channel, &value) in pixel.0.iter().enumerate() {
            chw[[channel, y as usize, x as usize]] =
                (value as f32 / 255.0 - norm.mean_rgb[channel]) / norm.std_rgb[channel];
        }
    }
    Ok(chw)
}

/// Stacks a batch of images into an NCHW tensor, preserving input order.
pub(crate) fn batch_tensor(
    paths: &[PathBuf],
    size: u32,
    norm: &InputNormalization,
) -> Result<Array4<f32>, CategorizeError> {
    let side = size as usize;
    let mut batch = Array4::<f32>::zeros((paths.len(), 3, side, side));
    for (i, path) in paths.iter().enumerate() {
        let chw = load_image_chw(path, size, norm)?;
        batch.index_axis_mut(Axis(0), i).assign(&chw);
    }
    Ok(batch)
}
