//! Listing filter.

use serde::{Deserialize, Serialize};

use super::model::{Job, JobKind, JobStatus};
use crate::error::ValidationError;

/// Kind and status predicates, AND-ed. `None` matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilter {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<JobKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

impl JobFilter {
    pub fn kind(kind: JobKind) -> Self {
        Self {
            kind: Some(kind),
            status: None,
        }
    }

    pub fn status(status: JobStatus) -> Self {
        Self {
            kind: None,
            status: Some(status),
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Build a validated filter from raw query parameters.
    ///
    /// An absent `type` means no kind predicate. A present but empty
    /// `status` is rejected.
    pub fn parse(kind: Option<&str>, status: Option<&str>) -> Result<Self, ValidationError> {
        let kind = match kind {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<JobKind>()?),
        };
        let status = status.map(str::parse::<JobStatus>).transpose()?;
        Ok(Self { kind, status })
    }

    pub fn matches(&self, job: &Job) -> bool {
        self.kind.is_none_or(|k| k == job.kind) && self.status.is_none_or(|s| s == job.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::model::JobPayload;

    #[test]
    fn empty_filter_matches_all() {
        let job = Job::from_payload(JobPayload::math(3));
        assert!(JobFilter::default().matches(&job));
    }

    #[test]
    fn predicates_are_anded() {
        let job = Job::from_payload(JobPayload::sleep("1s"));
        assert!(JobFilter::kind(JobKind::Sleep).matches(&job));
        assert!(!JobFilter::kind(JobKind::Math).matches(&job));
        assert!(
            JobFilter::kind(JobKind::Sleep)
                .with_status(JobStatus::Pending)
                .matches(&job)
        );
        assert!(
            !JobFilter::kind(JobKind::Sleep)
                .with_status(JobStatus::Completed)
                .matches(&job)
        );
    }

    #[test]
    fn parse_valid() {
        let filter = JobFilter::parse(Some("math"), Some("completed")).unwrap();
        assert_eq!(filter.kind, Some(JobKind::Math));
        assert_eq!(filter.status, Some(JobStatus::Completed));
        assert_eq!(JobFilter::parse(None, None).unwrap(), JobFilter::default());
    }

    #[test]
    fn parse_rejects_bad_values() {
        assert_eq!(
            JobFilter::parse(Some("invalid"), None),
            Err(ValidationError::InvalidKind("invalid".into()))
        );
        assert_eq!(
            JobFilter::parse(None, Some("")),
            Err(ValidationError::EmptyStatus)
        );
        assert_eq!(
            JobFilter::parse(None, Some("invalid")),
            Err(ValidationError::InvalidStatus("invalid".into()))
        );
    }
}
