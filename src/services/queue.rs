use tokio::sync::mpsc::{self, error::TrySendError, OwnedPermit};
use uuid::Uuid;

use crate::models::ad::AdRequest;

/// Job payload handed to the worker pool.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub job_id: Uuid,
    pub request: AdRequest,
}

/// Bounded in-process job queue feeding the worker pool.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<QueuedJob>,
}

/// A reserved slot in the queue. Dropping it without dispatching releases
/// the slot.
pub struct QueueSlot {
    permit: OwnedPermit<QueuedJob>,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` pending jobs.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<QueuedJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Reserve room for one job without waiting.
    pub fn reserve(&self) -> Result<QueueSlot, QueueError> {
        match self.sender.clone().try_reserve_owned() {
            Ok(permit) => Ok(QueueSlot { permit }),
            Err(TrySendError::Full(_)) => Err(QueueError::Full),
            Err(TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }

    /// Number of jobs waiting for a worker.
    pub fn depth(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

impl QueueSlot {
    pub fn dispatch(self, job: QueuedJob) {
        self.permit.send(job);
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Job queue is full")]
    Full,

    #[error("Job queue is shut down")]
    Closed,
}
