//! Worker pool: bounded queue, workers and the job store.
//!
//! Core components:
//! - `store`: Job store, the single source of truth (RwLock-guarded map)
//! - `queue`: Bounded job queue with non-blocking admission
//! - `strategy`: Per-kind execution strategies and their dispatch table
//! - `worker`: Dispatch loop (pending → running → completed/failed)
//! - `sink`: Result sink that persists finalized jobs
//! - `controller`: Lifecycle: start, submit, stop

pub mod controller;
pub mod queue;
pub mod sink;
pub mod store;
pub mod strategy;
pub mod worker;

pub use controller::WorkerPool;
pub use queue::JobQueue;
pub use sink::ResultSink;
pub use store::{JobStore, StoreSummary};
pub use strategy::{JobStrategy, MathStrategy, SleepStrategy, StrategyRegistry};
pub use worker::{Worker, WorkerDeps};
