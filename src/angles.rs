use std::collections::BTreeMap;

use crate::error::ReconstructionError;

const SPACING_TOLERANCE: f64 = 1e-9;

/// Indices of the projections kept when thinning the scan to `interval`
/// degrees.
///
/// Angles are walked in acquisition order: the first is always kept, every
/// later one only once it lies at least `interval` degrees away from the last
/// kept angle, in either direction.
pub fn subsample_by_interval(angles: &[f64], interval: u32) -> Result<Vec<usize>, ReconstructionError> {
    if interval == 0 {
        return Err(ReconstructionError::InvalidAngleInterval(interval));
    }
    let step = f64::from(interval);

    let mut kept = Vec::with_capacity(angles.len());
    let mut last: Option<f64> = None;
    for (index, &angle) in angles.iter().enumerate() {
        let keep = match last {
            None => true,
            Some(previous) => (angle - previous).abs() >= step - SPACING_TOLERANCE,
        };
        if keep {
            kept.push(index);
            last = Some(angle);
        }
    }
    Ok(kept)
}

/// Groups of projection indices that share exactly the same angle.
///
/// Groups are ordered by angle; indices within a group keep acquisition order.
pub fn find_duplicate_angles(angles: &[f64]) -> Vec<Vec<usize>> {
    let mut buckets: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (index, angle) in angles.iter().enumerate() {
        // Fold -0.0 into 0.0 so both land in one bucket.
        let key = if *angle == 0.0 { 0.0 } else { *angle };
        buckets.entry(key.to_bits()).or_default().push(index);
    }

    let mut groups: Vec<(f64, Vec<usize>)> = buckets
        .into_iter()
        .filter(|(_, indices)| indices.len() > 1)
        .map(|(bits, indices)| (f64::from_bits(bits), indices))
        .collect();
    groups.sort_by(|a, b| a.0.total_cmp(&b.0));
    groups.into_iter().map(|(_, indices)| indices).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_interval_keeps_every_degree() {
        let angles: Vec<f64> = (0..180).map(f64::from).collect();
        let kept = subsample_by_interval(&angles, 1).unwrap();
        assert_eq!(kept, (0..180).collect::<Vec<_>>());
    }

    #[test]
    fn coarser_interval_thins_the_scan() {
        let angles: Vec<f64> = (0..180).map(f64::from).collect();
        let kept = subsample_by_interval(&angles, 3).unwrap();
        assert_eq!(kept.len(), 60);
        assert!(kept.iter().all(|i| i % 3 == 0));
    }

    #[test]
    fn irregular_spacing_is_respected() {
        let angles = [0.0, 0.4, 1.1, 1.9, 2.2, 4.0];
        let kept = subsample_by_interval(&angles, 1).unwrap();
        assert_eq!(kept, vec![0, 2, 4, 5]);
    }

    #[test]
    fn descending_scan_is_thinned_like_an_ascending_one() {
        let angles: Vec<f64> = (0..180).map(|a| 90.0 - f64::from(a)).collect();
        let kept = subsample_by_interval(&angles, 1).unwrap();
        assert_eq!(kept, (0..180).collect::<Vec<_>>());

        let kept = subsample_by_interval(&angles, 3).unwrap();
        assert_eq!(kept.len(), 60);
        assert!(kept.iter().all(|i| i % 3 == 0));
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(matches!(
            subsample_by_interval(&[0.0], 0),
            Err(ReconstructionError::InvalidAngleInterval(0))
        ));
    }

    #[test]
    fn duplicates_are_grouped() {
        let angles = [10.0, 0.0, 5.0, 10.0, -0.0, 7.5, 10.0];
        let groups = find_duplicate_angles(&angles);
        assert_eq!(groups, vec![vec![1, 4], vec![0, 3, 6]]);
        assert!(find_duplicate_angles(&[1.0, 2.0, 3.0]).is_empty());
    }
}
