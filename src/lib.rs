//! # FBP-volume library
//!
//! This crate reconstructs a volume from a stack of parallel-beam X-ray
//! projections using filtered back-projection (FBP).

//!
//! Each detector row across all projections forms a sinogram, which is
//! ramp filtered (Ram-Lak tapered by a Hann window) and smeared back over a
//! square slice. Slices are divided by the reconstruction of an all-ones
//! sinogram to even out uneven angular coverage, then the whole volume is
//! rescaled to 8 bits by its global min/max.
//!
//! If the environment supports it slices are reconstructed in parallel
//! using rayon. Long jobs can be run on a dedicated worker thread which
//! reports per-slice progress and can be cancelled between slices.
//!
//! Inputs are assumed to be:
//!   - Flat-field corrected projections of identical size
//!   - Free of duplicate angles (duplicates are only reported)
//!   - Acquired with parallel-beam geometry
//!
//! # Examples
//!
//! ## Reconstructing in the background
//!
//! ```no_run
//! # use fbp_volume::{ReconstructionConfig, ReconstructionJob, JobOutcome, TargetResolution};
//! # use ndarray::Array3;
//! let projections = Array3::<f32>::ones((180, 64, 64));
//! let angles: Vec<f64> = (0..180).map(f64::from).collect();
//! let config = ReconstructionConfig::default().with_target_size(TargetResolution::Square(64));
//! let handle = ReconstructionJob::new(projections, angles, config)
//!     .spawn()
//!     .expect("should have started the reconstruction worker");
//! if let JobOutcome::Completed(volume) = handle.wait() {
//!     let image = volume
//!         .get_image_from_axis(32, fbp_volume::Orientation::Axial)
//!         .expect("should have returned the center slice");
//!     image.save("slice.png").expect("should have saved the slice");
//! }
//! ```

pub mod angles;
pub mod backprojection;
pub mod config;
pub mod enums;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod job;
pub mod normalization;
pub mod reconstructor;
pub mod resampler;
pub mod volume;

pub use backprojection::{SliceReconstructor, reconstruct_slice};
pub use config::ReconstructionConfig;
pub use enums::{Orientation, TargetResolution};
pub use error::ReconstructionError;
pub use filter::{RampFilter, padded_length, ramp_hann_kernel};
pub use geometry::Geometry;
pub use job::{JobOutcome, ReconstructionHandle, ReconstructionJob};
pub use normalization::NormalizationField;
pub use reconstructor::{CancelFlag, Progress, Reconstructor};
pub use resampler::ProjectionResampler;
pub use volume::ReconstructedVolume;
