use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tokio::task::{JoinError, JoinHandle};
use tracing::error;

#[derive(Debug, Error)]
pub enum WorkerShutdownError {
    #[error("worker had already stopped")]
    AlreadyStopped,
    #[error("worker consumption loop did not stop cleanly: {0}")]
    ConsumptionLoopFailed(#[from] JoinError),
}

/// Stops a running worker's consumption loop. Requests already handed to
/// their own tasks run to completion.
pub struct WorkerShutdownHandle {
    shutdown_signal_sender: Sender<()>,
    consumption_loop: JoinHandle<()>,
}

impl WorkerShutdownHandle {
    pub(crate) fn new(shutdown_signal_sender: Sender<()>, consumption_loop: JoinHandle<()>) -> Self {
        return WorkerShutdownHandle { shutdown_signal_sender, consumption_loop };
    }

    /// Signals the loop and waits for it to stop. Fails if the loop had
    /// already stopped on its own, for example because the request queue
    /// went away, or if it panicked.
    pub async fn shutdown(self) -> Result<(), WorkerShutdownError> {
        let signalled = self.shutdown_signal_sender.send(()).await;
        if let Err(err) = self.consumption_loop.await {
            error!(error = %err, "worker consumption loop did not stop cleanly");
            return Err(WorkerShutdownError::ConsumptionLoopFailed(err));
        }
        return signalled.map_err(|_| WorkerShutdownError::AlreadyStopped);
    }

    pub fn is_running(&self) -> bool {
        return !self.consumption_loop.is_finished();
    }
}
