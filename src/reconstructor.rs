use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use ndarray::{Array2, Array3, ArrayView3, Axis};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::{
    angles::find_duplicate_angles,
    backprojection::SliceReconstructor,
    config::ReconstructionConfig,
    error::ReconstructionError,
    filter::{RampFilter, padded_length},
    geometry::Geometry,
    normalization::NormalizationField,
    resampler::{ProjectionResampler, subsample_projections},
    volume::ReconstructedVolume,
};

/// Shared flag a caller sets to stop a running job between slices.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Completed slice count of a running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completion in percent, rounded to the nearest integer.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u8
    }

    pub fn is_done(&self) -> bool {
        self.completed == self.total
    }
}

enum SliceAbort {
    Cancelled,
    Failed(ReconstructionError),
}

impl From<ReconstructionError> for SliceAbort {
    fn from(error: ReconstructionError) -> Self {
        SliceAbort::Failed(error)
    }
}

/// Drives filtered back-projection over every row of a projection stack.
#[derive(Debug, Clone, Default)]
pub struct Reconstructor {
    config: ReconstructionConfig,
}

impl Reconstructor {
    pub fn new(config: ReconstructionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Reconstruct a `(n, height, width)` projection stack acquired at
    /// `angles` (degrees) into `height` slices.
    ///
    /// `on_progress` is called once per finished slice with a strictly
    /// increasing completed count. Returns `Ok(None)` when `cancel` was set
    /// before the last slice finished; no partial volume is ever returned.
    ///
    /// # Errors
    ///
    /// Invalid inputs and resampling problems are reported before any slice
    /// is reconstructed. A singular normalization or non-finite slice aborts
    /// the whole job.
    pub fn reconstruct<F>(
        &self,
        projections: ArrayView3<'_, f32>,
        angles: &[f64],
        cancel: &CancelFlag,
        on_progress: F,
    ) -> Result<Option<ReconstructedVolume>, ReconstructionError>
    where
        F: FnMut(Progress) + Send,
    {
        let started = Instant::now();
        Self::validate_inputs(projections, angles)?;
        self.config.validate()?;

        let duplicates = find_duplicate_angles(angles);
        if !duplicates.is_empty() {
            warn!(groups = duplicates.len(), "projection stack contains duplicate angles");
        }

        let (stack, angles) = self.prepare_stack(projections, angles)?;
        let (_, height, width) = stack.dim();
        info!(
            projections = angles.len(),
            slices = height,
            width,
            parallel = self.config.parallel,
            "starting reconstruction"
        );

        let filter = Arc::new(RampFilter::new(padded_length(width))?);
        let geometry = Arc::new(Geometry::new(width, &angles)?);
        let reconstructor = SliceReconstructor::new(geometry, Some(filter.clone()), self.config.circle);
        let normalization = NormalizationField::calibrate(&reconstructor)?;
        debug!(
            filter_length = filter.len(),
            min_field = normalization.min_in_field_of_view(),
            "precomputed geometry, filter and normalization"
        );

        let progress = Mutex::new((0usize, on_progress));
        let reconstruct_row = |row: usize| -> Result<Array2<f64>, SliceAbort> {
            if cancel.is_cancelled() {
                return Err(SliceAbort::Cancelled);
            }
            let sinogram = stack.index_axis(Axis(1), row).mapv(f64::from);
            let mut slice = reconstructor.reconstruct(sinogram.view())?;
            normalization.normalize(row, &mut slice)?;

            let mut guard = progress.lock().unwrap_or_else(PoisonError::into_inner);
            let (completed, report) = &mut *guard;
            *completed += 1;
            report(Progress {
                completed: *completed,
                total: height,
            });
            Ok(slice)
        };

        let slices: Result<Vec<Array2<f64>>, SliceAbort> = if self.config.parallel {
            (0..height).into_par_iter().map(reconstruct_row).collect()
        } else {
            (0..height).map(reconstruct_row).collect()
        };

        match slices {
            Ok(slices) => {
                let volume = ReconstructedVolume::from_f64_slices(&slices);
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "reconstruction finished"
                );
                Ok(Some(volume))
            }
            Err(SliceAbort::Cancelled) => {
                info!("reconstruction cancelled");
                Ok(None)
            }
            Err(SliceAbort::Failed(error)) => {
                warn!(%error, "reconstruction failed");
                Err(error)
            }
        }
    }

    fn validate_inputs(projections: ArrayView3<'_, f32>, angles: &[f64]) -> Result<(), ReconstructionError> {
        let (count, height, width) = projections.dim();
        if count == 0 {
            return Err(ReconstructionError::NoProjections);
        }
        if height == 0 || width == 0 {
            return Err(ReconstructionError::EmptyDetector { height, width });
        }
        if angles.len() != count {
            return Err(ReconstructionError::AngleCountMismatch {
                angles: angles.len(),
                projections: count,
            });
        }
        if let Some(index) = angles.iter().position(|a| !a.is_finite()) {
            return Err(ReconstructionError::NonFiniteAngle { index });
        }
        Ok(())
    }

    /// Apply angular thinning, then resampling, as configured.
    fn prepare_stack(
        &self,
        projections: ArrayView3<'_, f32>,
        angles: &[f64],
    ) -> Result<(Array3<f32>, Vec<f64>), ReconstructionError> {
        let (stack, angles) = match self.config.angle_interval {
            Some(interval) => {
                let (stack, kept) = subsample_projections(projections, angles, interval)?;
                debug!(interval, kept = kept.len(), "subsampled angles");
                (stack, kept)
            }
            None => (projections.to_owned(), angles.to_vec()),
        };

        let stack = match self.config.target_size.size() {
            Some(size) => ProjectionResampler::new(self.config.resample_filter).resample(stack.view(), size)?,
            None => stack,
        };
        Ok((stack, angles))
    }
}
