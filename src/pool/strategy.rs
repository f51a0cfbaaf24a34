//! Execution strategies, one per job kind, behind a single dispatch table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ExecutionError;
use crate::jobs::{Job, JobKind, JobPayload, JobResult, MathResult, SleepResult};

/// Executes the payload of one job kind.
///
/// Implementations that suspend must observe `cancel` at every suspension point.
#[async_trait]
pub trait JobStrategy: Send + Sync {
    /// Kind this strategy is registered under.
    fn kind(&self) -> JobKind;

    async fn execute(
        &self,
        payload: &JobPayload,
        cancel: &CancellationToken,
    ) -> Result<JobResult, ExecutionError>;
}

/// Dispatch table keyed on job kind.
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<JobKind, Arc<dyn JobStrategy>>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Registry with the built-in `sleep` and `math` strategies.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SleepStrategy));
        registry.register(Arc::new(MathStrategy));
        registry
    }

    /// Register a strategy, replacing any existing one for the same kind.
    pub fn register(&mut self, strategy: Arc<dyn JobStrategy>) {
        let kind = strategy.kind();
        self.strategies.insert(kind, strategy);
        tracing::debug!(%kind, "Registered job strategy");
    }

    pub fn kinds(&self) -> Vec<JobKind> {
        self.strategies.keys().copied().collect()
    }

    /// Run the strategy registered for `job.kind`.
    pub async fn execute(
        &self,
        job: &Job,
        cancel: &CancellationToken,
    ) -> Result<JobResult, ExecutionError> {
        let strategy = self
            .strategies
            .get(&job.kind)
            .ok_or_else(|| ExecutionError::UnknownKind {
                kind: job.kind.to_string(),
            })?;
        strategy.execute(&job.payload, cancel).await
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Suspends for the payload duration, or until cancelled.
#[derive(Debug, Default)]
pub struct SleepStrategy;

#[async_trait]
impl JobStrategy for SleepStrategy {
    fn kind(&self) -> JobKind {
        JobKind::Sleep
    }

    async fn execute(
        &self,
        payload: &JobPayload,
        cancel: &CancellationToken,
    ) -> Result<JobResult, ExecutionError> {
        let JobPayload::Sleep(payload) = payload else {
            return Err(ExecutionError::PayloadMismatch {
                kind: self.kind().to_string(),
            });
        };
        let duration = parse_duration(&payload.duration)?;
        let slept_for = duration.to_string();

        // Zero and negative durations elapse immediately.
        let wait = duration.wait_time();
        if wait.is_zero() {
            return Ok(JobResult::Sleep(SleepResult {
                slept_for,
                elapsed_ms: 0,
            }));
        }

        let start = Instant::now();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ExecutionError::Cancelled),
            _ = tokio::time::sleep(wait) => Ok(JobResult::Sleep(SleepResult {
                slept_for,
                elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            })),
        }
    }
}

/// Sums the integers in `0..number`.
#[derive(Debug, Default)]
pub struct MathStrategy;

#[async_trait]
impl JobStrategy for MathStrategy {
    fn kind(&self) -> JobKind {
        JobKind::Math
    }

    async fn execute(
        &self,
        payload: &JobPayload,
        _cancel: &CancellationToken,
    ) -> Result<JobResult, ExecutionError> {
        let JobPayload::Math(payload) = payload else {
            return Err(ExecutionError::PayloadMismatch {
                kind: self.kind().to_string(),
            });
        };
        // Wraps like a running 64-bit sum would; the boundary rejects inputs that overflow.
        let result = triangular(payload.number) as i64;
        Ok(JobResult::Math(MathResult { result }))
    }
}

fn triangular(n: i64) -> i128 {
    if n <= 0 {
        return 0;
    }
    let n = i128::from(n);
    n * (n - 1) / 2
}

/// `0 + 1 + ... + (n - 1)`, or `None` if it does not fit in an `i64`.
pub fn sum_below(n: i64) -> Option<i64> {
    i64::try_from(triangular(n)).ok()
}

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// A parsed duration with its sign.
///
/// Magnitudes range over a signed 64-bit nanosecond count. Negative zero
/// is normalized to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedDuration {
    negative: bool,
    magnitude: Duration,
}

impl SignedDuration {
    fn new(negative: bool, magnitude: Duration) -> Self {
        Self {
            negative: negative && !magnitude.is_zero(),
            magnitude,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn magnitude(&self) -> Duration {
        self.magnitude
    }

    /// How long a sleep actually waits: zero unless positive.
    pub fn wait_time(&self) -> Duration {
        if self.negative {
            Duration::ZERO
        } else {
            self.magnitude
        }
    }
}

impl From<Duration> for SignedDuration {
    fn from(magnitude: Duration) -> Self {
        Self::new(false, magnitude)
    }
}

impl fmt::Display for SignedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str(&format_duration(self.magnitude))
    }
}

/// Parse a duration such as `100ms`, `-1.5s` or `1h30m`.
///
/// Every number needs a unit, except a bare `0`. One leading sign is allowed.
pub fn parse_duration(input: &str) -> Result<SignedDuration, ExecutionError> {
    let invalid = |reason: String| ExecutionError::InvalidDuration {
        input: input.to_string(),
        reason,
    };

    let (negative, s) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    if s == "0" {
        return Ok(SignedDuration::new(negative, Duration::ZERO));
    }
    if s.is_empty() {
        return Err(invalid("empty duration".into()));
    }

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let int_len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (int_part, after) = rest.split_at(int_len);
        let (frac_part, after) = match after.strip_prefix('.') {
            Some(a) => a.split_at(a.find(|c: char| !c.is_ascii_digit()).unwrap_or(a.len())),
            None => ("", after),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("expected a number".into()));
        }

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, next) = after.split_at(unit_len);
        let scale = match unit_nanos(unit) {
            Some(scale) => scale,
            None if unit.is_empty() => return Err(invalid("missing unit".into())),
            None => return Err(invalid(format!("unknown unit {unit:?}"))),
        };

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| invalid("number out of range".into()))?
        };
        let mut value = whole
            .checked_mul(scale)
            .ok_or_else(|| invalid("duration out of range".into()))?;
        if !frac_part.is_empty() {
            // Digits past nanosecond precision of the largest unit cannot matter.
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: u128 = digits
                .parse()
                .map_err(|_| invalid("number out of range".into()))?;
            value += frac * scale / 10u128.pow(digits.len() as u32);
        }

        total = total
            .checked_add(value)
            .ok_or_else(|| invalid("duration out of range".into()))?;
        rest = next;
    }

    let limit: u128 = if negative {
        1 << 63
    } else {
        i64::MAX as u128
    };
    if total > limit {
        return Err(invalid("duration out of range".into()));
    }
    let nanos = u64::try_from(total).map_err(|_| invalid("duration out of range".into()))?;
    Ok(SignedDuration::new(negative, Duration::from_nanos(nanos)))
}

/// Render a duration canonically: `0s`, `250µs`, `100ms`, `1.5s`, `1m30s`, `2h0m0s`.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", decimal(nanos, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", decimal(nanos, 6));
    }

    let whole_secs = nanos / NANOS_PER_SEC;
    let hours = whole_secs / 3_600;
    let minutes = (whole_secs % 3_600) / 60;
    let secs = decimal((whole_secs % 60) * NANOS_PER_SEC + nanos % NANOS_PER_SEC, 9);

    if hours > 0 {
        format!("{hours}h{minutes}m{secs}s")
    } else if minutes > 0 {
        format!("{minutes}m{secs}s")
    } else {
        format!("{secs}s")
    }
}

fn decimal(value: u128, scale: u32) -> String {
    let divisor = 10u128.pow(scale);
    let whole = value / divisor;
    let frac = value % divisor;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{frac:0width$}", width = scale as usize);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
