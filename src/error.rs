use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconstructionError {
    #[error("No projections supplied")]
    NoProjections,

    #[error("Projection images must be non-empty, got {height}x{width}")]
    EmptyDetector { height: usize, width: usize },

    #[error("Angle count {angles} does not match projection count {projections}")]
    AngleCountMismatch { angles: usize, projections: usize },

    #[error("Angle at index {index} is not finite")]
    NonFiniteAngle { index: usize },

    #[error("Target size must be positive, got {0}")]
    InvalidTargetSize(usize),

    #[error("Angle interval must be positive, got {0}")]
    InvalidAngleInterval(u32),

    #[error("Filter length must be even and at least 2, got {0}")]
    InvalidFilterLength(usize),

    #[error("Sinogram shape {actual:?} does not match geometry {expected:?}")]
    SinogramShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Resampling failed: {0}")]
    Resampling(String),

    #[error("Resampled projection has shape {actual:?}, expected {expected:?}")]
    ResampledDimensions {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Normalization field is singular at ({row}, {col}) in slice {slice}")]
    NormalizationSingularity {
        slice: usize,
        row: usize,
        col: usize,
    },

    #[error("Slice {slice} produced non-finite values")]
    NonFiniteSlice { slice: usize },

    #[error("Reconstruction worker exited without reporting an outcome")]
    WorkerDisconnected,
}
