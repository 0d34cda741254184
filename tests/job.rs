use fbp_volume::{
    CancelFlag, JobOutcome, ReconstructionConfig, ReconstructionError, ReconstructionJob,
};
use ndarray::Array3;

fn scan(n: usize, height: usize, width: usize) -> (Array3<f32>, Vec<f64>) {
    let projections = Array3::from_shape_fn((n, height, width), |(p, r, c)| {
        ((p + 2 * r + 3 * c) % 9) as f32 * 0.25 + 0.5
    });
    let step = 180.0 / n as f64;
    let angles = (0..n).map(|a| a as f64 * step).collect();
    (projections, angles)
}

#[tokio::test]
async fn progress_is_reported_once_per_slice() {
    let (projections, angles) = scan(45, 7, 16);
    let mut handle = ReconstructionJob::new(projections, angles, ReconstructionConfig::default())
        .spawn()
        .unwrap();

    let mut updates = Vec::new();
    while let Some(progress) = handle.next_progress().await {
        updates.push(progress);
    }

    assert_eq!(updates.len(), 7);
    assert!(updates.windows(2).all(|w| w[0].completed < w[1].completed));
    assert!(updates.windows(2).all(|w| w[0].percent() < w[1].percent()));
    assert_eq!(updates.last().unwrap().percent(), 100);
    assert!(updates.iter().all(|p| p.total == 7));

    let outcome = handle.finish().await;
    assert!(outcome.is_completed());
    match outcome {
        JobOutcome::Completed(volume) => assert_eq!(volume.dim(), (7, 16, 16)),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn blocking_wait_delivers_the_volume() {
    let (projections, angles) = scan(30, 3, 10);
    let config = ReconstructionConfig::default().with_parallel(false);
    let mut handle = ReconstructionJob::new(projections, angles, config)
        .spawn()
        .unwrap();
    let first = loop {
        if let Some(progress) = handle.try_progress() {
            break progress;
        }
        std::thread::yield_now();
    };
    assert_eq!(first.completed, 1);

    let outcome = handle.wait();
    assert!(outcome.is_completed());
    let volume = outcome.into_volume().unwrap();
    assert_eq!(volume.dim(), (3, 10, 10));
}

#[tokio::test]
async fn cancelled_job_produces_no_volume() {
    let (projections, angles) = scan(20, 6, 8);
    let cancel = CancelFlag::new();
    cancel.cancel();
    let mut handle = ReconstructionJob::new(projections, angles, ReconstructionConfig::default())
        .with_cancel_flag(cancel)
        .spawn()
        .unwrap();

    assert!(handle.next_progress().await.is_none());
    let outcome = handle.finish().await;
    assert!(matches!(outcome, JobOutcome::Cancelled));
    assert!(!outcome.is_completed());
    assert!(outcome.into_volume().is_none());
}

#[tokio::test]
async fn cancelling_a_running_job_through_its_handle() {
    let height = 256;
    let (projections, angles) = scan(180, height, 64);
    let config = ReconstructionConfig::default().with_parallel(false);
    let mut handle = ReconstructionJob::new(projections, angles, config)
        .spawn()
        .unwrap();

    let first = handle.next_progress().await.unwrap();
    assert_eq!(first.completed, 1);
    handle.cancel();
    assert!(handle.cancel_flag().is_cancelled());

    let mut updates = 1;
    while handle.next_progress().await.is_some() {
        updates += 1;
    }
    assert!(updates < height, "job ran to the end after cancel ({updates} updates)");

    let outcome = handle.finish().await;
    assert!(matches!(outcome, JobOutcome::Cancelled));
    assert!(outcome.into_volume().is_none());
}

#[tokio::test]
async fn invalid_input_fails_without_progress() {
    let (projections, mut angles) = scan(10, 4, 8);
    angles.pop();
    let mut handle = ReconstructionJob::new(projections, angles, ReconstructionConfig::default())
        .spawn()
        .unwrap();

    assert!(handle.next_progress().await.is_none());
    match handle.finish().await {
        JobOutcome::Failed(ReconstructionError::AngleCountMismatch {
            angles: 9,
            projections: 10,
        }) => {}
        other => panic!("unexpected outcome {other:?}"),
    }
}
