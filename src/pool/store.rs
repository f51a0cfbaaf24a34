//! Job store: the single source of truth for job records.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::jobs::{Job, JobFilter, JobStatus};

/// Concurrent map from job id to record.
///
/// Readers share the lock; `put` takes it exclusively. No method holds
/// the lock across any other await point.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by id.
    pub async fn put(&self, job: Job) {
        self.jobs.write().await.insert(job.id, job);
    }

    /// Snapshot of one record.
    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Snapshot of all records matching `filter`, oldest first.
    ///
    /// Filters are assumed to be validated by the caller.
    pub async fn list(&self, filter: &JobFilter) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Count records by status.
    pub async fn summary(&self) -> StoreSummary {
        let jobs = self.jobs.read().await;

        let mut summary = StoreSummary::default();
        for job in jobs.values() {
            match job.status {
                JobStatus::Pending => summary.pending += 1,
                JobStatus::Running => summary.running += 1,
                JobStatus::Completed => summary.completed += 1,
                JobStatus::Failed => summary.failed += 1,
            }
        }

        summary.total = jobs.len();
        summary
    }
}

/// Per-status record counts.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::jobs::{JobKind, JobPayload, JobResult, MathResult};

    fn completed_math(n: i64) -> Job {
        let mut job = Job::from_payload(JobPayload::math(n));
        job.mark_running().unwrap();
        job.finish(Ok(JobResult::Math(MathResult { result: 0 })))
            .unwrap();
        job
    }

    #[tokio::test]
    async fn put_and_get() {
        let store = JobStore::new();
        let job = Job::from_payload(JobPayload::sleep("1s"));
        let id = job.id;
        store.put(job).await;

        let fetched = store.get(id).await.unwrap();
        assert_eq!(fetched.kind, JobKind::Sleep);
        assert!(store.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn put_overwrites() {
        let store = JobStore::new();
        let mut job = Job::from_payload(JobPayload::math(2));
        store.put(job.clone()).await;

        job.mark_running().unwrap();
        store.put(job.clone()).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(job.id).await.unwrap().status, JobStatus::Running);
    }

    #[tokio::test]
    async fn list_filters() {
        let store = JobStore::new();
        store.put(Job::from_payload(JobPayload::sleep("1s"))).await;
        store.put(Job::from_payload(JobPayload::math(5))).await;
        store.put(completed_math(3)).await;

        assert_eq!(store.list(&JobFilter::default()).await.len(), 3);

        let math = store.list(&JobFilter::kind(JobKind::Math)).await;
        assert_eq!(math.len(), 2);
        assert!(math.iter().all(|j| j.kind == JobKind::Math));

        let completed = store.list(&JobFilter::status(JobStatus::Completed)).await;
        assert_eq!(completed.len(), 1);

        let none = store
            .list(&JobFilter::kind(JobKind::Sleep).with_status(JobStatus::Completed))
            .await;
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn list_is_a_snapshot() {
        let store = JobStore::new();
        let job = Job::from_payload(JobPayload::math(1));
        store.put(job.clone()).await;

        let mut snapshot = store.list(&JobFilter::default()).await;
        snapshot[0].status = JobStatus::Failed;

        assert_eq!(store.get(job.id).await.unwrap().status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn concurrent_writers_and_readers() {
        let store = Arc::new(JobStore::new());
        let mut handles = Vec::new();

        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.put(Job::from_payload(JobPayload::math(i))).await;
                store.list(&JobFilter::default()).await.len()
            }));
        }

        for handle in handles {
            let seen = handle.await.unwrap();
            assert!((1..=20).contains(&seen));
        }
        assert_eq!(store.len().await, 20);
    }

    #[tokio::test]
    async fn summary_counts() {
        let store = JobStore::new();
        store.put(Job::from_payload(JobPayload::math(1))).await;
        store.put(completed_math(2)).await;

        let summary = store.summary().await;
        assert_eq!(summary.total, 2);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.completed, 1);
    }
}
