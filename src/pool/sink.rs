//! Result sink: the one path through which finalized jobs reach the store.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::jobs::Job;
use crate::pool::store::JobStore;

pub struct ResultSink {
    store: Arc<JobStore>,
    results: mpsc::Receiver<Job>,
}

impl ResultSink {
    pub fn new(store: Arc<JobStore>, results: mpsc::Receiver<Job>) -> Self {
        Self { store, results }
    }

    /// Drain finalized jobs into the store until every sender is gone.
    ///
    /// Workers hold the senders, so this outlives the last worker and never
    /// loses a result produced during shutdown.
    pub async fn run(mut self) {
        let mut persisted = 0usize;
        while let Some(job) = self.results.recv().await {
            tracing::info!(job_id = %job.id, status = %job.status, "Job finished");
            self.store.put(job).await;
            persisted += 1;
        }
        tracing::debug!(persisted, "Result sink stopped");
    }
}
