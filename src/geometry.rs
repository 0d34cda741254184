use std::f64::consts::FRAC_PI_2;

use ndarray::{Array1, Array2};

use crate::error::ReconstructionError;

/// Pixel-to-ray mapping shared by every slice of a job.
///
/// Grids use "ij" indexing: `x[[i, j]] = i - center` and
/// `y[[i, j]] = j - center`, so `x` varies along the first axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub center: usize,
    pub x: Array2<i32>,
    pub y: Array2<i32>,
    pub cos_vals: Array1<f64>,
    pub sin_vals: Array1<f64>,
}

impl Geometry {
    /// Precompute coordinate grids for a `width` x `width` slice and ray
    /// direction cosines for each angle (degrees).
    ///
    /// The quarter turn added to every angle aligns the detector axis with
    /// the direction rays are smeared back along.
    pub fn new(width: usize, angles: &[f64]) -> Result<Self, ReconstructionError> {
        if width == 0 {
            return Err(ReconstructionError::EmptyDetector { height: 0, width });
        }
        if angles.is_empty() {
            return Err(ReconstructionError::NoProjections);
        }
        if let Some(index) = angles.iter().position(|a| !a.is_finite()) {
            return Err(ReconstructionError::NonFiniteAngle { index });
        }

        let center = width / 2;
        let offset = center as i32;
        let x = Array2::from_shape_fn((width, width), |(i, _)| i as i32 - offset);
        let y = Array2::from_shape_fn((width, width), |(_, j)| j as i32 - offset);

        let radians = angles.iter().map(|a| a.to_radians() + FRAC_PI_2);
        let cos_vals = radians.clone().map(f64::cos).collect();
        let sin_vals = radians.map(f64::sin).collect();

        Ok(Self {
            center,
            x,
            y,
            cos_vals,
            sin_vals,
        })
    }

    pub fn width(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_angles(&self) -> usize {
        self.cos_vals.len()
    }

    /// Detector sample hit by projection `projection` at pixel `(row, col)`.
    ///
    /// The ray coordinate is rounded half to even; indices outside
    /// `[0, width)` yield `None`.
    #[inline]
    pub fn sample_index(&self, projection: usize, row: usize, col: usize) -> Option<usize> {
        let t = self.x[[row, col]] as f64 * self.cos_vals[projection]
            + self.y[[row, col]] as f64 * self.sin_vals[projection];
        self.detector_index(t)
    }

    #[inline]
    pub(crate) fn detector_index(&self, t: f64) -> Option<usize> {
        let index = (t + self.center as f64).round_ties_even();
        if index >= 0.0 && index < self.width() as f64 {
            Some(index as usize)
        } else {
            None
        }
    }

    /// True when the pixel lies outside the inscribed circle.
    #[inline]
    pub fn outside_circle(&self, row: usize, col: usize) -> bool {
        let dx = row as f64 - self.center as f64;
        let dy = col as f64 - self.center as f64;
        (dx * dx + dy * dy).sqrt() > self.center as f64
    }

    /// Number of projections whose ray lands on the detector at each pixel.
    pub fn coverage(&self, circle: bool) -> Array2<u32> {
        let width = self.width();
        Array2::from_shape_fn((width, width), |(row, col)| {
            if circle && self.outside_circle(row, col) {
                return 0;
            }
            (0..self.n_angles())
                .filter(|&p| self.sample_index(p, row, col).is_some())
                .count() as u32
        })
    }
}
