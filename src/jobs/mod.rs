//! Job data model and boundary validation.
//!
//! - `model`: Job record, kinds, payloads and the status state machine
//! - `filter`: kind/status predicates for listing
//! - `request`: parsing raw requests into validated jobs

pub mod filter;
pub mod model;
pub mod request;

pub use filter::JobFilter;
pub use model::{
    Job, JobKind, JobPayload, JobResult, JobStatus, MathPayload, MathResult, SleepPayload,
    SleepResult,
};
pub use request::{CreateJobRequest, parse_job_id};
