use image::{
    ImageBuffer, Luma,
    imageops::{self, FilterType},
};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, s};
use rayon::prelude::*;
use tracing::debug;

use crate::{angles::subsample_by_interval, error::ReconstructionError};

const BAND_LOW: f32 = 0.25;
const BAND_WIDTH: f32 = 0.5;

/// Resizes every projection of a stack to a common square size.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionResampler {
    filter: FilterType,
}

impl Default for ProjectionResampler {
    fn default() -> Self {
        Self::new(FilterType::Lanczos3)
    }
}

impl ProjectionResampler {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Resample a `(n, height, width)` stack to `(n, size, size)`.
    ///
    /// Projections are processed in parallel and never modified in place.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero, a projection holds non-finite
    /// samples or a resized image comes back with the wrong shape.
    pub fn resample(&self, projections: ArrayView3<'_, f32>, size: usize) -> Result<Array3<f32>, ReconstructionError> {
        if size == 0 {
            return Err(ReconstructionError::InvalidTargetSize(size));
        }

        let images: Vec<Array2<f32>> = projections
            .outer_iter()
            .into_par_iter()
            .map(|projection| self.resize_projection(projection, size))
            .collect::<Result<_, _>>()?;

        Self::validate_dimensions(&images, (size, size))?;
        debug!(
            projections = images.len(),
            from = ?(projections.dim().1, projections.dim().2),
            to = size,
            "resampled projection stack"
        );
        Ok(Self::build_stack(&images, (size, size)))
    }

    // The image crate clamps floating point pixels to [0, 1] while resizing.
    // Each projection is mapped into [0.25, 0.75] and back so filter
    // overshoot of up to half the projection's range survives the clamp.
    fn resize_projection(&self, projection: ArrayView2<'_, f32>, size: usize) -> Result<Array2<f32>, ReconstructionError> {
        let (height, width) = projection.dim();
        if height == 0 || width == 0 {
            return Err(ReconstructionError::EmptyDetector { height, width });
        }
        if projection.iter().any(|v| !v.is_finite()) {
            return Err(ReconstructionError::Resampling(
                "projection contains non-finite samples".to_string(),
            ));
        }

        let (min, max) = projection
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = max - min;
        let scale = if range > 0.0 { BAND_WIDTH / range } else { 0.0 };

        let pixels: Vec<f32> = projection.iter().map(|&v| (v - min) * scale + BAND_LOW).collect();
        let image: ImageBuffer<Luma<f32>, Vec<f32>> = ImageBuffer::from_raw(width as u32, height as u32, pixels)
            .ok_or_else(|| ReconstructionError::Resampling("pixel buffer does not match projection size".to_string()))?;

        let resized = imageops::resize(&image, size as u32, size as u32, self.filter);
        let (out_width, out_height) = resized.dimensions();
        let actual = (out_height as usize, out_width as usize);
        let resized = Array2::from_shape_vec(actual, resized.into_raw()).map_err(|_| {
            ReconstructionError::ResampledDimensions {
                expected: (size, size),
                actual,
            }
        })?;

        Ok(resized.mapv(|v| (v - BAND_LOW) / BAND_WIDTH * range + min))
    }

    fn validate_dimensions(images: &[Array2<f32>], expected: (usize, usize)) -> Result<(), ReconstructionError> {
        match images.iter().find(|image| image.dim() != expected) {
            Some(image) => Err(ReconstructionError::ResampledDimensions {
                expected,
                actual: image.dim(),
            }),
            None => Ok(()),
        }
    }

    fn build_stack(images: &[Array2<f32>], (height, width): (usize, usize)) -> Array3<f32> {
        let mut stack = Array3::<f32>::zeros((images.len(), height, width));
        for (i, image) in images.iter().enumerate() {
            stack.slice_mut(s![i, .., ..]).assign(image);
        }
        stack
    }
}

/// Keep only the projections spaced at least `interval` degrees apart.
pub fn subsample_projections(
    projections: ArrayView3<'_, f32>,
    angles: &[f64],
    interval: u32,
) -> Result<(Array3<f32>, Vec<f64>), ReconstructionError> {
    let kept = subsample_by_interval(angles, interval)?;
    let stack = projections.select(Axis(0), &kept);
    let angles = kept.iter().map(|&i| angles[i]).collect();
    Ok((stack, angles))
}
