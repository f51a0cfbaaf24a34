//! Boundary parsing: raw requests into validated jobs and filters.

use serde::Deserialize;
use uuid::Uuid;

use super::model::{Job, JobKind, JobPayload, MathPayload, SleepPayload};
use crate::error::ValidationError;
use crate::pool::strategy::sum_below;

/// Body of `POST /jobs`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CreateJobRequest {
    /// Validate kind and payload and produce the strongly typed payload.
    pub fn parse_payload(&self) -> Result<(JobKind, JobPayload), ValidationError> {
        let kind: JobKind = self.kind.parse()?;
        let invalid = |e: serde_json::Error| ValidationError::InvalidPayload {
            kind: kind.to_string(),
            reason: e.to_string(),
        };

        let payload = match kind {
            JobKind::Sleep => {
                let payload: SleepPayload =
                    serde_json::from_value(self.payload.clone()).map_err(invalid)?;
                if payload.duration.trim().is_empty() {
                    return Err(ValidationError::MissingDuration);
                }
                JobPayload::Sleep(payload)
            }
            JobKind::Math => {
                let payload: MathPayload =
                    serde_json::from_value(self.payload.clone()).map_err(invalid)?;
                if sum_below(payload.number).is_none() {
                    return Err(ValidationError::NumberTooLarge(payload.number));
                }
                JobPayload::Math(payload)
            }
        };
        Ok((kind, payload))
    }

    /// Build a fresh pending job.
    pub fn into_job(self) -> Result<Job, ValidationError> {
        let (kind, payload) = self.parse_payload()?;
        Ok(Job::new(kind, payload))
    }
}

/// Parse an opaque job identifier.
pub fn parse_job_id(raw: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(raw.trim()).map_err(|e| ValidationError::InvalidId(e.to_string()))
}
