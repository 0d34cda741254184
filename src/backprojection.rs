use std::sync::Arc;

use ndarray::{Array2, ArrayView2, Zip};

use crate::{error::ReconstructionError, filter::RampFilter, geometry::Geometry};

/// Reconstruct one slice from its sinogram (`n_angles` x `width`).
///
/// With a filter the rows are ramp filtered first, otherwise the result is a
/// plain (blurred) backprojection. Every projection adds its sample into each
/// pixel whose ray lands on the detector; rays that miss are skipped.
pub fn reconstruct_slice(
    sinogram: ArrayView2<'_, f64>,
    geometry: &Geometry,
    filter: Option<&RampFilter>,
    circle: bool,
) -> Result<Array2<f64>, ReconstructionError> {
    let width = geometry.width();
    let expected = (geometry.n_angles(), width);
    if sinogram.dim() != expected {
        return Err(ReconstructionError::SinogramShape {
            expected,
            actual: sinogram.dim(),
        });
    }

    let filtered = match filter {
        Some(filter) => Some(filter.apply(sinogram)?),
        None => None,
    };
    let sinogram = match &filtered {
        Some(filtered) => filtered.view(),
        None => sinogram.view(),
    };

    let mut slice = Array2::<f64>::zeros((width, width));
    for (projection, row) in sinogram.outer_iter().enumerate() {
        let cos = geometry.cos_vals[projection];
        let sin = geometry.sin_vals[projection];
        Zip::from(&mut slice)
            .and(&geometry.x)
            .and(&geometry.y)
            .for_each(|pixel, &x, &y| {
                if let Some(index) = geometry.detector_index(x as f64 * cos + y as f64 * sin) {
                    *pixel += row[index];
                }
            });
    }

    if circle {
        for ((r, c), pixel) in slice.indexed_iter_mut() {
            if geometry.outside_circle(r, c) {
                *pixel = 0.0;
            }
        }
    }

    Ok(slice)
}

/// Geometry, filter and masking choice bundled for reuse across slices.
#[derive(Debug, Clone)]
pub struct SliceReconstructor {
    geometry: Arc<Geometry>,
    filter: Option<Arc<RampFilter>>,
    circle: bool,
}

impl SliceReconstructor {
    pub fn new(geometry: Arc<Geometry>, filter: Option<Arc<RampFilter>>, circle: bool) -> Self {
        Self {
            geometry,
            filter,
            circle,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn circle(&self) -> bool {
        self.circle
    }

    pub fn reconstruct(&self, sinogram: ArrayView2<'_, f64>) -> Result<Array2<f64>, ReconstructionError> {
        reconstruct_slice(
            sinogram,
            &self.geometry,
            self.filter.as_deref(),
            self.circle,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn degrees(count: usize) -> Vec<f64> {
        (0..count).map(|a| a as f64).collect()
    }

    #[test]
    fn unfiltered_ones_count_rays() {
        let geometry = Geometry::new(12, &degrees(30)).unwrap();
        let ones = Array2::<f64>::ones((30, 12));
        let slice = reconstruct_slice(ones.view(), &geometry, None, false).unwrap();
        let coverage = geometry.coverage(false);
        for ((r, c), &value) in slice.indexed_iter() {
            assert_abs_diff_eq!(value, coverage[[r, c]] as f64);
        }
    }

    #[test]
    fn single_projection_smears_along_rays() {
        let geometry = Geometry::new(8, &[0.0]).unwrap();
        let mut sinogram = Array2::<f64>::zeros((1, 8));
        sinogram[[0, 3]] = 2.0;
        let slice = reconstruct_slice(sinogram.view(), &geometry, None, false).unwrap();
        for ((_, c), &value) in slice.indexed_iter() {
            let expected = if c == 3 { 2.0 } else { 0.0 };
            assert_eq!(value, expected);
        }
    }

    #[test]
    fn circle_mask_clears_corners() {
        let geometry = Geometry::new(16, &degrees(18)).unwrap();
        let ones = Array2::<f64>::ones((18, 16));
        let slice = reconstruct_slice(ones.view(), &geometry, None, true).unwrap();
        assert_eq!(slice[[0, 0]], 0.0);
        assert_eq!(slice[[15, 15]], 0.0);
        assert_eq!(slice[[8, 8]], 18.0);
    }

    #[test]
    fn sinogram_shape_must_match_geometry() {
        let geometry = Geometry::new(8, &degrees(4)).unwrap();
        let wrong = Array2::<f64>::zeros((3, 8));
        assert!(matches!(
            reconstruct_slice(wrong.view(), &geometry, None, false),
            Err(ReconstructionError::SinogramShape {
                expected: (4, 8),
                actual: (3, 8)
            })
        ));
    }

    #[test]
    fn filtered_point_is_sharper_than_unfiltered() {
        let width = 32;
        let angles = degrees(180);
        let geometry = Arc::new(Geometry::new(width, &angles).unwrap());
        let filter = Arc::new(RampFilter::for_width(width).unwrap());

        let mut sinogram = Array2::<f64>::zeros((angles.len(), width));
        for p in 0..angles.len() {
            sinogram[[p, geometry.center]] = 1.0;
        }

        let filtered = SliceReconstructor::new(geometry.clone(), Some(filter), false)
            .reconstruct(sinogram.view())
            .unwrap();
        let plain = SliceReconstructor::new(geometry, None, false)
            .reconstruct(sinogram.view())
            .unwrap();

        let c = width / 2;
        let ratio = |s: &Array2<f64>| s[[c + 6, c]].abs() / s[[c, c]];
        assert!(ratio(&filtered) < ratio(&plain));
        assert!(filtered[[c, c]] > 0.0);
    }
}
