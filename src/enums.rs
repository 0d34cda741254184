/// Axis along which a reconstructed volume is sliced.
///
/// `Axial` is the reconstruction axis: index `i` returns the slice built from
/// detector row `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Axial,
    Coronal,
    Sagittal,
}

/// Square size the projections are resampled to before reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetResolution {
    #[default]
    Original,
    Square(usize),
}

impl TargetResolution {
    /// Sizes offered to interactive users; larger sizes cost roughly cubically
    /// more time.
    pub const PRESETS: [TargetResolution; 4] = [
        TargetResolution::Square(64),
        TargetResolution::Square(128),
        TargetResolution::Square(256),
        TargetResolution::Square(512),
    ];

    pub fn size(&self) -> Option<usize> {
        match self {
            TargetResolution::Original => None,
            TargetResolution::Square(size) => Some(*size),
        }
    }
}

impl From<Option<usize>> for TargetResolution {
    fn from(size: Option<usize>) -> Self {
        size.map_or(TargetResolution::Original, TargetResolution::Square)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_ascending_squares() {
        let sizes: Vec<usize> = TargetResolution::PRESETS.iter().filter_map(|p| p.size()).collect();
        assert_eq!(sizes, vec![64, 128, 256, 512]);
        assert_eq!(TargetResolution::default().size(), None);
        assert_eq!(TargetResolution::from(Some(96)), TargetResolution::Square(96));
        assert_eq!(TargetResolution::from(None), TargetResolution::Original);
    }
}
