//! Worker pool lifecycle: admission, startup and shutdown.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::PoolConfig;
use crate::error::{ConfigError, SubmitError};
use crate::jobs::{Job, JobFilter};
use crate::pool::queue::JobQueue;
use crate::pool::sink::ResultSink;
use crate::pool::store::{JobStore, StoreSummary};
use crate::pool::strategy::StrategyRegistry;
use crate::pool::worker::{Worker, WorkerDeps};

/// Fixed-size pool of workers fed by a bounded queue.
///
/// Call [`start`](Self::start) once; calling it again spawns a second set
/// of workers. After [`stop`](Self::stop) no submission succeeds.
pub struct WorkerPool {
    config: PoolConfig,
    store: Arc<JobStore>,
    strategies: Arc<StrategyRegistry>,
    queue: JobQueue,
    shutdown: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
    live: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Create a pool whose cancellation signal is a child of `parent`.
    pub fn new(config: PoolConfig, parent: &CancellationToken) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            queue: JobQueue::new(config.queue_capacity),
            config,
            store: Arc::new(JobStore::new()),
            strategies: Arc::new(StrategyRegistry::with_defaults()),
            shutdown: parent.child_token(),
            handles: Mutex::new(Vec::new()),
            live: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Replace the dispatch table. Only meaningful before `start`.
    pub fn with_strategies(mut self, strategies: StrategyRegistry) -> Self {
        self.strategies = Arc::new(strategies);
        self
    }

    /// Launch the workers and the result sink.
    pub fn start(&self) {
        tracing::info!(
            workers = self.config.workers,
            queue_capacity = self.config.queue_capacity,
            "Starting worker pool"
        );

        let (results_tx, results_rx) = mpsc::channel(self.config.queue_capacity);
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);

        let sink = ResultSink::new(Arc::clone(&self.store), results_rx);
        handles.push(self.spawn_tracked(sink.run()));

        for id in 0..self.config.workers {
            let deps = WorkerDeps {
                store: Arc::clone(&self.store),
                strategies: Arc::clone(&self.strategies),
                queue: self.queue.receiver(),
                results: results_tx.clone(),
                shutdown: self.shutdown.clone(),
            };
            handles.push(self.spawn_tracked(Worker::new(id, deps).run()));
        }
    }

    /// Cancel in-flight work, wait for every worker and the sink, then close the queue.
    pub async fn stop(&self) {
        tracing::info!("Stopping worker pool");
        self.shutdown.cancel();

        let handles = std::mem::take(
            &mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for result in join_all(handles).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Pool task panicked");
            }
        }

        self.queue.close().await;
        tracing::info!("Worker pool stopped");
    }

    /// Admit a job without blocking.
    ///
    /// Cancellation is checked before capacity, so a pool that is shutting
    /// down reports `ShutDown` even when its queue is also full.
    pub async fn submit(&self, job: Job, cancel: &CancellationToken) -> Result<Uuid, SubmitError> {
        let admitted = self.admit(job, cancel).await;
        if let Err(e) = &admitted {
            tracing::warn!(error = %e, "Job rejected");
        }
        admitted
    }

    async fn admit(&self, job: Job, cancel: &CancellationToken) -> Result<Uuid, SubmitError> {
        if self.shutdown.is_cancelled() {
            return Err(SubmitError::ShutDown);
        }
        if cancel.is_cancelled() {
            return Err(SubmitError::Cancelled);
        }

        let slot = self.queue.try_reserve()?;
        let id = job.id;
        // Stored before it becomes visible to workers, so `pending` never
        // overwrites `running`.
        self.store.put(job.clone()).await;
        slot.send(job);

        tracing::debug!(job_id = %id, "Job queued");
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.store.get(id).await
    }

    pub async fn list(&self, filter: &JobFilter) -> Vec<Job> {
        self.store.list(filter).await
    }

    pub async fn summary(&self) -> StoreSummary {
        self.store.summary().await
    }

    /// Jobs waiting in the queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Worker and sink tasks that have not exited yet.
    pub fn live_tasks(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn spawn_tracked<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.live.fetch_add(1, Ordering::SeqCst);
        let guard = LiveGuard(Arc::clone(&self.live));
        tokio::spawn(async move {
            let _guard = guard;
            task.await;
        })
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobPayload, JobStatus};

    fn pool(workers: usize, capacity: usize) -> WorkerPool {
        WorkerPool::new(
            PoolConfig::new(workers, capacity).unwrap(),
            &CancellationToken::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn zero_capacity_rejected() {
        let config = PoolConfig {
            workers: 1,
            queue_capacity: 0,
        };
        assert!(WorkerPool::new(config, &CancellationToken::new()).is_err());
    }

    #[tokio::test]
    async fn submit_stores_pending() {
        let pool = pool(0, 2);
        pool.start();

        let job = Job::from_payload(JobPayload::math(3));
        let id = pool.submit(job, &CancellationToken::new()).await.unwrap();

        assert_eq!(pool.get(id).await.unwrap().status, JobStatus::Pending);
        assert_eq!(pool.queued(), 1);
        pool.stop().await;
    }

    #[tokio::test]
    async fn caller_cancellation_rejects() {
        let pool = pool(1, 2);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let job = Job::from_payload(JobPayload::math(3));
        let id = job.id;
        let err = pool.submit(job, &cancel).await.unwrap_err();
        assert_eq!(err, SubmitError::Cancelled);
        assert!(pool.get(id).await.is_none());
    }

    #[tokio::test]
    async fn parent_cancellation_shuts_pool() {
        let parent = CancellationToken::new();
        let pool = WorkerPool::new(PoolConfig::default(), &parent).unwrap();
        parent.cancel();

        assert!(pool.is_shut_down());
        let err = pool
            .submit(Job::from_payload(JobPayload::math(1)), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, SubmitError::ShutDown);
    }

    #[tokio::test]
    async fn shutdown_wins_over_full_queue() {
        let parent = CancellationToken::new();
        let pool = WorkerPool::new(PoolConfig::new(0, 1).unwrap(), &parent).unwrap();
        pool.start();

        let cancel = CancellationToken::new();
        pool.submit(Job::from_payload(JobPayload::math(1)), &cancel)
            .await
            .unwrap();
        let err = pool
            .submit(Job::from_payload(JobPayload::math(2)), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, SubmitError::QueueFull { capacity: 1 });

        parent.cancel();
        let job = Job::from_payload(JobPayload::math(3));
        let id = job.id;
        let err = pool.submit(job, &cancel).await.unwrap_err();
        assert_eq!(err, SubmitError::ShutDown);
        assert!(pool.get(id).await.is_none());

        pool.stop().await;
    }

    #[tokio::test]
    async fn stop_joins_all_tasks() {
        let pool = pool(3, 4);
        pool.start();
        assert_eq!(pool.live_tasks(), 4);

        pool.stop().await;
        assert_eq!(pool.live_tasks(), 0);
    }
}
