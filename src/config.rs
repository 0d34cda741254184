use image::imageops::FilterType;

use crate::{enums::TargetResolution, error::ReconstructionError};

/// Settings for one reconstruction job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructionConfig {
    pub target_size: TargetResolution,
    /// Minimum spacing in degrees between the projections that are kept.
    pub angle_interval: Option<u32>,
    /// Zero everything outside the inscribed circle of each slice.
    pub circle: bool,
    /// Reconstruct slices on the rayon pool instead of one by one.
    pub parallel: bool,
    pub resample_filter: FilterType,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            target_size: TargetResolution::Original,
            angle_interval: None,
            circle: false,
            parallel: true,
            resample_filter: FilterType::Lanczos3,
        }
    }
}

impl ReconstructionConfig {
    pub fn with_target_size(mut self, target_size: impl Into<TargetResolution>) -> Self {
        self.target_size = target_size.into();
        self
    }

    pub fn with_angle_interval(mut self, interval: Option<u32>) -> Self {
        self.angle_interval = interval;
        self
    }

    pub fn with_circle(mut self, circle: bool) -> Self {
        self.circle = circle;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_resample_filter(mut self, filter: FilterType) -> Self {
        self.resample_filter = filter;
        self
    }

    /// Rejects settings that can never produce a volume.
    pub fn validate(&self) -> Result<(), ReconstructionError> {
        if let TargetResolution::Square(0) = self.target_size {
            return Err(ReconstructionError::InvalidTargetSize(0));
        }
        if let Some(0) = self.angle_interval {
            return Err(ReconstructionError::InvalidAngleInterval(0));
        }
        Ok(())
    }

    /// Number of slices the job will produce for projections of `height` rows.
    pub fn output_slices(&self, height: usize) -> usize {
        self.target_size.size().unwrap_or(height)
    }
}
