//! Bounded job queue.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::error::SubmitError;
use crate::jobs::Job;

/// Fixed-capacity queue of jobs awaiting a worker.
///
/// Single producer handle, many consumers: workers share the receiver
/// behind an async mutex.
#[derive(Debug)]
pub struct JobQueue {
    tx: mpsc::Sender<Job>,
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    capacity: usize,
}

/// A reserved queue slot. Sending through it cannot fail.
pub struct Slot<'a> {
    permit: mpsc::Permit<'a, Job>,
}

impl Slot<'_> {
    pub fn send(self, job: Job) {
        self.permit.send(job);
    }
}

impl JobQueue {
    /// Create a queue. `capacity` must be at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            capacity,
        }
    }

    /// Number of jobs currently waiting.
    pub fn len(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve a slot without blocking.
    pub fn try_reserve(&self) -> Result<Slot<'_>, SubmitError> {
        match self.tx.try_reserve() {
            Ok(permit) => Ok(Slot { permit }),
            Err(mpsc::error::TrySendError::Full(())) => Err(SubmitError::QueueFull {
                capacity: self.capacity,
            }),
            Err(mpsc::error::TrySendError::Closed(())) => Err(SubmitError::ShutDown),
        }
    }

    /// Consumer handle shared by the workers.
    pub fn receiver(&self) -> Arc<Mutex<mpsc::Receiver<Job>>> {
        Arc::clone(&self.rx)
    }

    /// Stop accepting jobs. Jobs already queued stay buffered.
    pub async fn close(&self) {
        self.rx.lock().await.close();
    }
}
