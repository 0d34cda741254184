use ndarray::{Array2, Zip};

use crate::{backprojection::SliceReconstructor, error::ReconstructionError};

/// Reconstruction of an all-ones sinogram, used to even out how strongly
/// each pixel is covered by rays.
///
/// Coverage is kept next to the field so that pixels no ray ever reaches can
/// be told apart from genuinely singular ones.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationField {
    field: Array2<f64>,
    coverage: Array2<u32>,
}

impl NormalizationField {
    /// Calibrate against the geometry, filter and mask of `reconstructor`.
    pub fn calibrate(reconstructor: &SliceReconstructor) -> Result<Self, ReconstructionError> {
        let geometry = reconstructor.geometry();
        let ones = Array2::<f64>::ones((geometry.n_angles(), geometry.width()));
        let field = reconstructor.reconstruct(ones.view())?;
        let coverage = geometry.coverage(reconstructor.circle());
        Ok(Self { field, coverage })
    }

    pub fn field(&self) -> &Array2<f64> {
        &self.field
    }

    pub fn coverage(&self) -> &Array2<u32> {
        &self.coverage
    }

    /// Smallest field value inside the inscribed circle.
    pub fn min_in_field_of_view(&self) -> f64 {
        let (rows, cols) = self.field.dim();
        let center = (rows / 2) as f64;
        self.field
            .indexed_iter()
            .filter(|((r, c), _)| {
                let dr = *r as f64 - center;
                let dc = *c as f64 - (cols / 2) as f64;
                (dr * dr + dc * dc).sqrt() <= center
            })
            .map(|(_, &v)| v)
            .fold(f64::INFINITY, f64::min)
    }

    /// Divide `slice` by the field in place.
    ///
    /// Pixels without coverage become zero. A zero or non-finite divisor at a
    /// covered pixel is a singularity, and any non-finite quotient fails the
    /// slice; nothing non-finite is ever written back.
    pub fn normalize(&self, slice_index: usize, slice: &mut Array2<f64>) -> Result<(), ReconstructionError> {
        let singular = Zip::indexed(&self.field).and(&self.coverage).fold(
            None,
            |found: Option<(usize, usize)>, index, &divisor, &rays| {
                found.or_else(|| (rays > 0 && (divisor == 0.0 || !divisor.is_finite())).then_some(index))
            },
        );
        if let Some((row, col)) = singular {
            return Err(ReconstructionError::NormalizationSingularity {
                slice: slice_index,
                row,
                col,
            });
        }

        let mut quotient = slice.clone();
        Zip::from(&mut quotient)
            .and(&self.field)
            .and(&self.coverage)
            .for_each(|value, &divisor, &rays| {
                *value = if rays == 0 { 0.0 } else { *value / divisor };
            });

        if quotient.iter().any(|v| !v.is_finite()) {
            return Err(ReconstructionError::NonFiniteSlice { slice: slice_index });
        }

        *slice = quotient;
        Ok(())
    }
}
