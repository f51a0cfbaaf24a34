//! Worker dispatch loop.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::jobs::Job;
use crate::pool::store::JobStore;
use crate::pool::strategy::StrategyRegistry;

/// Shared dependencies for worker execution.
#[derive(Clone)]
pub struct WorkerDeps {
    pub store: Arc<JobStore>,
    pub strategies: Arc<StrategyRegistry>,
    pub queue: Arc<Mutex<mpsc::Receiver<Job>>>,
    /// Finalized jobs go to the result sink through here.
    pub results: mpsc::Sender<Job>,
    /// Pool-wide cancellation signal.
    pub shutdown: CancellationToken,
}

/// One of the pool's fixed set of workers.
pub struct Worker {
    id: usize,
    deps: WorkerDeps,
}

impl Worker {
    pub fn new(id: usize, deps: WorkerDeps) -> Self {
        Self { id, deps }
    }

    /// Pull and run jobs until shutdown or until the queue is closed and drained.
    pub async fn run(self) {
        tracing::debug!(worker_id = self.id, "Worker started");

        loop {
            let next = tokio::select! {
                biased;
                _ = self.deps.shutdown.cancelled() => None,
                job = self.next_job() => job,
            };

            match next {
                Some(job) => self.process(job).await,
                None => break,
            }
        }

        tracing::info!(worker_id = self.id, "Worker shutting down");
    }

    async fn next_job(&self) -> Option<Job> {
        self.deps.queue.lock().await.recv().await
    }

    /// Run one job through running -> terminal and hand it to the sink.
    ///
    /// Job-level failures end up in the record; nothing here returns early
    /// with an error.
    async fn process(&self, mut job: Job) {
        if let Err(e) = job.mark_running() {
            tracing::warn!(worker_id = self.id, job_id = %job.id, error = %e, "Skipping job");
            return;
        }
        self.deps.store.put(job.clone()).await;
        tracing::info!(worker_id = self.id, job_id = %job.id, kind = %job.kind, "Processing job");

        let outcome = self
            .deps
            .strategies
            .execute(&job, &self.deps.shutdown)
            .await;
        if let Err(e) = &outcome {
            tracing::warn!(worker_id = self.id, job_id = %job.id, error = %e, "Job failed");
        }

        if let Err(e) = job.finish(outcome) {
            tracing::warn!(worker_id = self.id, job_id = %job.id, error = %e, "Cannot finalize job");
            return;
        }

        let job_id = job.id;
        if self.deps.results.send(job).await.is_err() {
            tracing::error!(worker_id = self.id, %job_id, "Result sink closed, dropping result");
        }
    }
}
