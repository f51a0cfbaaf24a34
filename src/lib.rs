//! Worker pool service: bounded job queue, fixed worker set, pollable job state.

pub mod api;
pub mod config;
pub mod error;
pub mod jobs;
pub mod pool;
pub mod service;
pub mod shutdown;
