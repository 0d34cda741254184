use std::thread::{self, JoinHandle};

use futures::channel::oneshot;
use ndarray::Array3;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::{
    config::ReconstructionConfig,
    error::ReconstructionError,
    reconstructor::{CancelFlag, Progress, Reconstructor},
    volume::ReconstructedVolume,
};

/// Terminal result of a background reconstruction.
#[derive(Debug)]
pub enum JobOutcome {
    Completed(ReconstructedVolume),
    Failed(ReconstructionError),
    /// Stopped on request; no volume is produced.
    Cancelled,
}

impl JobOutcome {
    pub fn into_volume(self) -> Option<ReconstructedVolume> {
        match self {
            JobOutcome::Completed(volume) => Some(volume),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }
}

/// A reconstruction to be run on its own worker thread.
pub struct ReconstructionJob {
    projections: Array3<f32>,
    angles: Vec<f64>,
    config: ReconstructionConfig,
    cancel: CancelFlag,
}

impl ReconstructionJob {
    pub fn new(projections: Array3<f32>, angles: Vec<f64>, config: ReconstructionConfig) -> Self {
        Self {
            projections,
            angles,
            config,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Start the worker and return the caller's side of its channels.
    ///
    /// The progress channel holds one message per slice, so the worker never
    /// waits on a slow reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system refuses to start the thread.
    pub fn spawn(self) -> std::io::Result<ReconstructionHandle> {
        let slices = self.config.output_slices(self.projections.dim().1).max(1);
        let (progress_tx, progress_rx) = mpsc::channel(slices);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let cancel = self.cancel.clone();

        let worker = thread::Builder::new()
            .name("fbp-reconstruction".to_string())
            .spawn(move || {
                let reconstructor = Reconstructor::new(self.config);
                let result = reconstructor.reconstruct(
                    self.projections.view(),
                    &self.angles,
                    &self.cancel,
                    |progress| {
                        // A dropped receiver only means nobody is watching.
                        let _ = progress_tx.blocking_send(progress);
                    },
                );
                let outcome = match result {
                    Ok(Some(volume)) => JobOutcome::Completed(volume),
                    Ok(None) => JobOutcome::Cancelled,
                    Err(error) => JobOutcome::Failed(error),
                };
                if outcome_tx.send(outcome).is_err() {
                    debug!("reconstruction handle dropped before the job finished");
                }
            })?;

        Ok(ReconstructionHandle {
            progress: progress_rx,
            outcome: outcome_rx,
            cancel,
            worker: Some(worker),
        })
    }
}

/// Caller side of a running [`ReconstructionJob`].
pub struct ReconstructionHandle {
    progress: mpsc::Receiver<Progress>,
    outcome: oneshot::Receiver<JobOutcome>,
    cancel: CancelFlag,
    worker: Option<JoinHandle<()>>,
}

impl ReconstructionHandle {
    /// Ask the worker to stop before its next slice.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Wait for the next progress update; `None` once the worker is done.
    pub async fn next_progress(&mut self) -> Option<Progress> {
        self.progress.recv().await
    }

    /// Progress update already queued, if any.
    pub fn try_progress(&mut self) -> Option<Progress> {
        self.progress.try_recv().ok()
    }

    /// Wait for the terminal outcome.
    pub async fn finish(mut self) -> JobOutcome {
        let outcome = (&mut self.outcome).await;
        self.join_worker();
        outcome.unwrap_or(JobOutcome::Failed(ReconstructionError::WorkerDisconnected))
    }

    /// Blocking variant of [`finish`](Self::finish) for callers outside an
    /// async runtime.
    pub fn wait(self) -> JobOutcome {
        futures::executor::block_on(self.finish())
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("reconstruction worker panicked");
            }
        }
    }
}
