//! Job record and its lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ExecutionError, JobError, ValidationError};

/// Discriminator selecting the execution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Sleep,
    Math,
}

impl JobKind {
    pub const ALL: [JobKind; 2] = [JobKind::Sleep, JobKind::Math];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::Math => "math",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sleep" => Ok(Self::Sleep),
            "math" => Ok(Self::Math),
            other => Err(ValidationError::InvalidKind(other.to_string())),
        }
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted into the queue, waiting for a worker.
    Pending,
    /// Picked up by a worker.
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Check if this state allows transitioning to another state.
    pub fn can_transition_to(&self, target: JobStatus) -> bool {
        use JobStatus::*;

        matches!(
            (self, target),
            (Pending, Running) | (Running, Completed) | (Running, Failed)
        )
    }

    /// Terminal states are final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(ValidationError::EmptyStatus),
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepPayload {
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathPayload {
    pub number: i64,
}

/// Kind-specific input, strongly typed before it reaches the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobPayload {
    Sleep(SleepPayload),
    Math(MathPayload),
}

impl JobPayload {
    pub fn sleep(duration: impl Into<String>) -> Self {
        Self::Sleep(SleepPayload {
            duration: duration.into(),
        })
    }

    pub fn math(number: i64) -> Self {
        Self::Math(MathPayload { number })
    }

    /// The kind this payload shape belongs to.
    pub fn kind(&self) -> JobKind {
        match self {
            Self::Sleep(_) => JobKind::Sleep,
            Self::Math(_) => JobKind::Math,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepResult {
    /// Requested duration, rendered canonically (e.g. `100ms`).
    pub slept_for: String,
    /// Wall-clock time actually spent sleeping.
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathResult {
    pub result: i64,
}

/// Kind-specific output of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobResult {
    Sleep(SleepResult),
    Math(MathResult),
}

/// One unit of work and its lifecycle state.
///
/// The store holds the authoritative copy; queue and result channel
/// carry clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "uid")]
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub payload: JobPayload,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a pending job with a fresh id.
    ///
    /// Kind and payload are not cross-checked here; the boundary builds
    /// consistent pairs and the strategies reject mismatches.
    pub fn new(kind: JobKind, payload: JobPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            payload,
            status: JobStatus::Pending,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Create a job whose kind is derived from the payload shape.
    pub fn from_payload(payload: JobPayload) -> Self {
        Self::new(payload.kind(), payload)
    }

    fn transition_to(&mut self, target: JobStatus) -> Result<(), JobError> {
        if !self.status.can_transition_to(target) {
            return Err(JobError::InvalidTransition {
                id: self.id,
                state: self.status.to_string(),
                target: target.to_string(),
            });
        }
        self.status = target;
        Ok(())
    }

    /// pending -> running, stamping `started_at`.
    pub fn mark_running(&mut self) -> Result<(), JobError> {
        self.transition_to(JobStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// running -> completed or failed, stamping `completed_at`.
    pub fn finish(&mut self, outcome: Result<JobResult, ExecutionError>) -> Result<(), JobError> {
        match outcome {
            Ok(result) => {
                self.transition_to(JobStatus::Completed)?;
                self.result = Some(result);
            }
            Err(e) => {
                self.transition_to(JobStatus::Failed)?;
                self.error = Some(e.to_string());
            }
        }
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
