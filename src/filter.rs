use std::{f64::consts::PI, fmt, sync::Arc};

use ndarray::{Array1, Array2, ArrayView2};
use rustfft::{Fft, FftPlanner, num_complex::Complex64};

use crate::error::ReconstructionError;

/// Smallest padded length used for row filtering.
pub const MIN_PADDED_LENGTH: usize = 64;

/// Padded row length for projections of `width` samples: the next power of
/// two at or above `2 * width`, never below [`MIN_PADDED_LENGTH`].
pub fn padded_length(width: usize) -> usize {
    (2 * width).next_power_of_two().max(MIN_PADDED_LENGTH)
}

/// Frequency response of the discrete ramp filter tapered by a Hann window.
///
/// The ramp is built from its spatial impulse response (0.25 at the origin,
/// zero on even taps, `-1 / (pi * d)^2` on odd taps at circular distance `d`)
/// so that its DC term is not forced to zero.
pub fn ramp_hann_kernel(length: usize) -> Result<Array1<f64>, ReconstructionError> {
    if length < 2 || length % 2 != 0 {
        return Err(ReconstructionError::InvalidFilterLength(length));
    }

    let mut impulse: Vec<Complex64> = (0..length)
        .map(|k| {
            let value = if k == 0 {
                0.25
            } else if k % 2 == 1 {
                let distance = k.min(length - k) as f64;
                -1.0 / (PI * distance).powi(2)
            } else {
                0.0
            };
            Complex64::new(value, 0.0)
        })
        .collect();

    FftPlanner::<f64>::new()
        .plan_fft_forward(length)
        .process(&mut impulse);

    let half = length / 2;
    let denominator = (length - 1) as f64;
    let kernel = (0..length)
        .map(|k| {
            let n = ((k + half) % length) as f64;
            let hann = 0.5 - 0.5 * (2.0 * PI * n / denominator).cos();
            2.0 * impulse[k].re * hann
        })
        .collect();

    Ok(kernel)
}

/// Ramp/Hann kernel together with the FFT plans needed to apply it.
///
/// Built once per job and shared read-only between slices.
#[derive(Clone)]
pub struct RampFilter {
    kernel: Array1<f64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for RampFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RampFilter")
            .field("length", &self.kernel.len())
            .finish()
    }
}

impl RampFilter {
    pub fn new(length: usize) -> Result<Self, ReconstructionError> {
        let kernel = ramp_hann_kernel(length)?;
        let mut planner = FftPlanner::<f64>::new();
        Ok(Self {
            kernel,
            forward: planner.plan_fft_forward(length),
            inverse: planner.plan_fft_inverse(length),
        })
    }

    /// Filter sized for projections of `width` samples.
    pub fn for_width(width: usize) -> Result<Self, ReconstructionError> {
        Self::new(padded_length(width))
    }

    pub fn len(&self) -> usize {
        self.kernel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernel.is_empty()
    }

    pub fn kernel(&self) -> &Array1<f64> {
        &self.kernel
    }

    /// Convolve every sinogram row with the filter.
    ///
    /// Rows are zero-padded on the right to the kernel length, so the circular
    /// convolution never wraps signal back into the first `width` samples.
    pub fn apply(&self, sinogram: ArrayView2<'_, f64>) -> Result<Array2<f64>, ReconstructionError> {
        let (rows, width) = sinogram.dim();
        let length = self.len();
        if width > length {
            return Err(ReconstructionError::InvalidFilterLength(length));
        }

        let scale = 1.0 / length as f64;
        let mut buffer = vec![Complex64::new(0.0, 0.0); length];
        let scratch_len = self
            .forward
            .get_inplace_scratch_len()
            .max(self.inverse.get_inplace_scratch_len());
        let mut scratch = vec![Complex64::new(0.0, 0.0); scratch_len];
        let mut filtered = Array2::<f64>::zeros((rows, width));

        for (row, mut out) in sinogram.outer_iter().zip(filtered.outer_iter_mut()) {
            buffer.fill(Complex64::new(0.0, 0.0));
            for (slot, &value) in buffer.iter_mut().zip(row.iter()) {
                slot.re = value;
            }

            self.forward.process_with_scratch(&mut buffer, &mut scratch);
            for (slot, &gain) in buffer.iter_mut().zip(self.kernel.iter()) {
                *slot *= gain;
            }
            self.inverse.process_with_scratch(&mut buffer, &mut scratch);

            for (dst, src) in out.iter_mut().zip(buffer.iter()) {
                *dst = src.re * scale;
            }
        }

        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    #[test]
    fn padded_length_is_power_of_two_with_floor() {
        assert_eq!(padded_length(1), 64);
        assert_eq!(padded_length(32), 64);
        assert_eq!(padded_length(33), 128);
        assert_eq!(padded_length(100), 256);
        assert_eq!(padded_length(512), 1024);
    }

    #[test]
    fn kernel_has_requested_length_and_is_finite() {
        for length in (2..=130).step_by(2) {
            let kernel = ramp_hann_kernel(length).unwrap();
            assert_eq!(kernel.len(), length);
            assert!(kernel.iter().all(|v| v.is_finite()), "length {length}");
        }
    }

    #[test]
    fn odd_or_tiny_lengths_are_rejected() {
        for length in [0, 1, 3, 65] {
            assert!(matches!(
                ramp_hann_kernel(length),
                Err(ReconstructionError::InvalidFilterLength(l)) if l == length
            ));
        }
    }

    #[test]
    fn kernel_peaks_below_nyquist() {
        let kernel = ramp_hann_kernel(64).unwrap();
        // Ramp rises from DC, the window pulls Nyquist back toward zero.
        assert!(kernel[0].abs() < kernel[8]);
        assert!(kernel[32].abs() < kernel[8]);
    }

    #[test]
    fn filter_holds_the_padded_kernel() {
        let filter = RampFilter::for_width(20).unwrap();
        assert_eq!(filter.len(), 64);
        assert!(!filter.is_empty());
        assert_eq!(filter.kernel(), &ramp_hann_kernel(64).unwrap());
    }

    #[test]
    fn zero_rows_stay_zero() {
        let filter = RampFilter::new(64).unwrap();
        let sinogram = Array2::<f64>::zeros((3, 20));
        let filtered = filter.apply(sinogram.view()).unwrap();
        assert_eq!(filtered.dim(), (3, 20));
        assert!(filtered.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn filtering_is_linear_per_row() {
        let filter = RampFilter::for_width(16).unwrap();
        let mut sinogram = Array2::<f64>::zeros((2, 16));
        sinogram[[0, 5]] = 1.0;
        sinogram[[1, 5]] = 3.0;
        let filtered = filter.apply(sinogram.view()).unwrap();
        for col in 0..16 {
            assert_abs_diff_eq!(filtered[[1, col]], 3.0 * filtered[[0, col]], epsilon = 1e-12);
        }
        // A filtered impulse keeps its peak and grows negative side lobes.
        assert!(filtered[[0, 5]] > 0.0);
        assert!(filtered[[0, 3]] < 0.0);
        assert!(filtered[[0, 7]] < 0.0);
        assert!(filtered[[0, 5]] > filtered[[0, 4]]);
    }

    #[test]
    fn rows_wider_than_kernel_are_rejected() {
        let filter = RampFilter::new(4).unwrap();
        let sinogram = Array2::<f64>::zeros((1, 8));
        assert!(filter.apply(sinogram.view()).is_err());
    }
}
