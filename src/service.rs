//! Job service, the thin layer between the HTTP handlers and the pool.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{self, JobError, SubmitError};
use crate::jobs::{CreateJobRequest, Job, JobFilter, parse_job_id};
use crate::pool::{StoreSummary, WorkerPool};

#[derive(Clone)]
pub struct JobService {
    pool: Arc<WorkerPool>,
    /// Caller-side signal for submissions (server shutdown).
    cancel: CancellationToken,
}

impl JobService {
    pub fn new(pool: Arc<WorkerPool>, cancel: CancellationToken) -> Self {
        Self { pool, cancel }
    }

    /// Submit a validated job and return the record as admitted.
    pub async fn create_job(&self, job: Job) -> Result<Job, SubmitError> {
        let admitted = job.clone();
        self.pool.submit(job, &self.cancel).await?;
        Ok(admitted)
    }

    /// Validate a raw request and submit the resulting job.
    pub async fn create_from_request(&self, request: CreateJobRequest) -> error::Result<Job> {
        let job = request.into_job()?;
        Ok(self.create_job(job).await?)
    }

    pub async fn list_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        self.pool.list(filter).await
    }

    pub async fn get_job(&self, id: Uuid) -> Result<Job, JobError> {
        self.pool.get(id).await.ok_or(JobError::NotFound { id })
    }

    /// Look up a job by its textual id.
    pub async fn find_job(&self, uid: &str) -> error::Result<Job> {
        let id = parse_job_id(uid)?;
        Ok(self.get_job(id).await?)
    }

    pub async fn summary(&self) -> StoreSummary {
        self.pool.summary().await
    }
}
