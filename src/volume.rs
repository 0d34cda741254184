use crate::enums::Orientation;

use image::GrayImage;
use ndarray::Array2;
use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::s;
use rayon::prelude::*;

/// Reconstructed 8-bit volume, shaped `(slices, width, width)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconstructedVolume {
    pub data: Array3<u8>,
}

impl ReconstructedVolume {
    pub fn new(data: Array3<u8>) -> Self {
        Self { data }
    }

    /// Rescale float slices by the global min/max of all of them to `0..=255`.
    ///
    /// Values are truncated, not rounded. A volume without contrast maps to
    /// all zeros. Slices must share one shape and be finite.
    pub fn from_f64_slices(slices: &[Array2<f64>]) -> Self {
        let Some(first) = slices.first() else {
            return Self::default();
        };
        let (rows, cols) = first.dim();

        let (min, max) = slices
            .par_iter()
            .map(|slice| {
                slice
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
            })
            .reduce(
                || (f64::INFINITY, f64::NEG_INFINITY),
                |a, b| (a.0.min(b.0), a.1.max(b.1)),
            );
        let range = max - min;

        let mut data = Array3::<u8>::zeros((slices.len(), rows, cols));
        if range > 0.0 {
            data.outer_iter_mut()
                .into_par_iter()
                .zip(slices.par_iter())
                .for_each(|(mut out, slice)| {
                    out.zip_mut_with(slice, |dst, &v| *dst = Self::normalize_to_u8(v, min, range));
                });
        }

        Self { data }
    }

    #[inline]
    fn normalize_to_u8(value: f64, min: f64, range: f64) -> u8 {
        ((value - min) / range * 255.0).clamp(0.0, 255.0) as u8
    }

    /// Get the dimensions of the volume (slices, rows, columns)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    pub fn into_inner(self) -> Array3<u8> {
        self.data
    }

    /// Reconstructed slice `index`, as produced from detector row `index`.
    pub fn slice(&self, index: usize) -> Option<ArrayView2<'_, u8>> {
        self.get_slice_from_axis(index, &Orientation::Axial)
    }

    pub fn get_slice_from_axis(&self, index: usize, orientation: &Orientation) -> Option<ArrayView2<'_, u8>> {
        if !self.is_valid_index(index, orientation) {
            return None;
        }
        let slice = match orientation {
            Orientation::Axial => self.data.slice(s![index, .., ..]),
            Orientation::Coronal => self.data.slice(s![.., index, ..]),
            Orientation::Sagittal => self.data.slice(s![.., .., index]),
        };
        Some(slice)
    }

    pub fn get_image_from_axis(&self, index: usize, orientation: Orientation) -> Option<GrayImage> {
        let slice = self.get_slice_from_axis(index, &orientation)?;
        Self::slice_to_image(&slice)
    }

    fn slice_to_image(slice: &ArrayView2<'_, u8>) -> Option<GrayImage> {
        let (height, width) = slice.dim();
        let pixel_data: Vec<u8> = slice.into_par_iter().copied().collect();
        GrayImage::from_raw(width as u32, height as u32, pixel_data)
    }

    fn is_valid_index(&self, index: usize, orientation: &Orientation) -> bool {
        let dim = self.data.dim();
        let max_index = match orientation {
            Orientation::Axial => dim.0,
            Orientation::Coronal => dim.1,
            Orientation::Sagittal => dim.2,
        };
        index < max_index
    }
}
