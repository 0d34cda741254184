use fbp_volume::{
    Geometry, JobOutcome, Orientation, ReconstructionConfig, ReconstructionJob, TargetResolution,
};
use ndarray::Array3;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SIZE: usize = 64;

/// Projections of a single bright point at `(row, col)` of slice `slice`.
fn point_phantom(angles: &[f64], slice: usize, row: usize, col: usize) -> Array3<f32> {
    let geometry = Geometry::new(SIZE, angles).expect("should have built phantom geometry");
    let mut projections = Array3::<f32>::zeros((angles.len(), SIZE, SIZE));
    for projection in 0..angles.len() {
        if let Some(sample) = geometry.sample_index(projection, row, col) {
            projections[[projection, slice, sample]] = 1.0;
        }
    }
    projections
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let angles: Vec<f64> = (0..180).map(f64::from).collect();
    let projections = point_phantom(&angles, SIZE / 2, 20, 40);
    let config = ReconstructionConfig::default()
        .with_target_size(TargetResolution::Square(SIZE))
        .with_angle_interval(Some(1));

    let mut handle = ReconstructionJob::new(projections, angles, config)
        .spawn()
        .expect("should have started the reconstruction worker");
    while let Some(progress) = handle.next_progress().await {
        if progress.percent() % 10 == 0 {
            info!(percent = progress.percent(), "reconstructing");
        }
    }

    match handle.finish().await {
        JobOutcome::Completed(volume) => {
            let image = volume
                .get_image_from_axis(SIZE / 2, Orientation::Axial)
                .expect("should have returned the phantom slice");
            image.save("result.png").expect("should have saved the slice");
            info!("saved result.png");
        }
        JobOutcome::Cancelled => info!("reconstruction cancelled"),
        JobOutcome::Failed(error) => panic!("reconstruction failed: {error}"),
    }
}
