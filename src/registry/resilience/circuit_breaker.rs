//! Failure-ratio circuit breaker.
//!
//! The breaker counts requests in generations. A generation ends whenever the
//! state changes or, while closed, when the reset interval elapses; results
//! reported for an older generation are ignored.
//!
//! - **Closed**: calls pass through. Once `min_requests` have been seen in the
//!   window and the failure ratio reaches `failure_ratio_percent`, the circuit
//!   opens.
//! - **Open**: calls fail immediately without running. After `open_timeout`
//!   the circuit becomes half-open.
//! - **Half-open**: up to `max_half_open_requests` trial calls are admitted.
//!   Any failure reopens the circuit; that many consecutive successes close
//!   it.

use crate::registry::domain::CircuitBreakerConfig;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Calls pass through.
    Closed,
    /// Calls fail fast.
    Open,
    /// A limited number of trial calls pass through.
    HalfOpen,
}

impl CircuitState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Request counts for the current generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Admitted requests, including those still in flight.
    pub requests: u32,
    /// Successful requests.
    pub total_successes: u32,
    /// Failed requests.
    pub total_failures: u32,
    /// Successes since the last failure.
    pub consecutive_successes: u32,
    /// Failures since the last success.
    pub consecutive_failures: u32,
}

impl Counts {
    const fn on_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    const fn on_success(&mut self) {
        self.total_successes = self.total_successes.saturating_add(1);
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        self.consecutive_failures = 0;
    }

    const fn on_failure(&mut self) {
        self.total_failures = self.total_failures.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_successes = 0;
    }

    const fn on_abandon(&mut self) {
        self.requests = self.requests.saturating_sub(1);
    }

    const fn clear(&mut self) {
        *self = Self {
            requests: 0,
            total_successes: 0,
            total_failures: 0,
            consecutive_successes: 0,
            consecutive_failures: 0,
        };
    }
}

/// Errors returned by [`CircuitBreaker::execute`].
#[derive(Debug, Clone, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open; the operation was not run.
    #[error("circuit breaker '{0}' is open")]
    Open(String),

    /// The half-open trial budget is exhausted; the operation was not run.
    #[error("circuit breaker '{0}' is half-open and has no trial requests left")]
    TooManyRequests(String),

    /// The operation ran and failed.
    #[error(transparent)]
    Inner(E),
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    generation: u64,
    counts: Counts,
    expiry: Option<DateTime<Utc>>,
}

/// Failure-ratio circuit breaker driven by an injected clock.
pub struct CircuitBreaker<C>
where
    C: Clock + Send + Sync,
{
    name: String,
    config: CircuitBreakerConfig,
    clock: Arc<C>,
    inner: Mutex<BreakerState>,
}

impl<C> fmt::Debug for CircuitBreaker<C>
where
    C: Clock + Send + Sync,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn deadline_after(now: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    let delta = TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX);
    now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl<C> CircuitBreaker<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a closed breaker.
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig, clock: Arc<C>) -> Self {
        let now = clock.utc();
        let mut state = BreakerState {
            state: CircuitState::Closed,
            generation: 0,
            counts: Counts::default(),
            expiry: None,
        };
        Self::start_generation(&config, &mut state, now);
        Self {
            name: name.into(),
            config,
            clock,
            inner: Mutex::new(state),
        }
    }

    /// Returns the breaker name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the breaker configuration.
    #[must_use]
    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Returns the current state, applying any elapsed timeout first.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        let now = self.clock.utc();
        let mut guard = self.lock();
        self.refresh(&mut guard, now);
        guard.state
    }

    /// Returns the counts of the current generation.
    #[must_use]
    pub fn counts(&self) -> Counts {
        let now = self.clock.utc();
        let mut guard = self.lock();
        self.refresh(&mut guard, now);
        guard.counts
    }

    /// Returns a human-readable summary for health reporting.
    #[must_use]
    pub fn status(&self) -> String {
        let now = self.clock.utc();
        let mut guard = self.lock();
        self.refresh(&mut guard, now);
        let counts = guard.counts;
        format!(
            "{} (requests: {}, successes: {}, failures: {}, consecutive failures: {})",
            guard.state,
            counts.requests,
            counts.total_successes,
            counts.total_failures,
            counts.consecutive_failures
        )
    }

    /// Runs `operation` unless the circuit rejects it, recording the outcome.
    ///
    /// Dropping the returned future before `operation` completes records
    /// nothing and frees the admission slot.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitBreakerError::Open`] or
    /// [`CircuitBreakerError::TooManyRequests`] without running `operation`
    /// when the circuit rejects the call, or [`CircuitBreakerError::Inner`]
    /// when `operation` fails.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let admission = self.admit::<E>()?;
        let result = operation().await;
        admission.settle(result.is_ok());
        result.map_err(CircuitBreakerError::Inner)
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // Every critical section leaves the state consistent, so a poisoned
        // lock still guards valid data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit<E>(&self) -> Result<Admission<'_, C>, CircuitBreakerError<E>> {
        let now = self.clock.utc();
        let mut guard = self.lock();
        self.refresh(&mut guard, now);
        match guard.state {
            CircuitState::Open => return Err(CircuitBreakerError::Open(self.name.clone())),
            CircuitState::HalfOpen
                if guard.counts.requests >= self.config.max_half_open_requests =>
            {
                return Err(CircuitBreakerError::TooManyRequests(self.name.clone()));
            }
            CircuitState::Closed | CircuitState::HalfOpen => {}
        }
        guard.counts.on_request();
        Ok(Admission {
            breaker: self,
            generation: guard.generation,
            settled: false,
        })
    }

    fn record(&self, generation: u64, success: bool) {
        let now = self.clock.utc();
        let mut guard = self.lock();
        self.refresh(&mut guard, now);
        if guard.generation != generation {
            return;
        }

        match (guard.state, success) {
            (CircuitState::Closed, _) => {
                if success {
                    guard.counts.on_success();
                } else {
                    guard.counts.on_failure();
                }
                // A success can complete the minimum window while the
                // failure ratio already exceeds the threshold.
                if self.ready_to_trip(guard.counts) {
                    self.transition(&mut guard, CircuitState::Open, now);
                }
            }
            (CircuitState::HalfOpen, true) => {
                guard.counts.on_success();
                if guard.counts.consecutive_successes >= self.config.max_half_open_requests {
                    self.transition(&mut guard, CircuitState::Closed, now);
                }
            }
            (CircuitState::HalfOpen, false) => {
                self.transition(&mut guard, CircuitState::Open, now);
            }
            (CircuitState::Open, _) => {}
        }
    }

    fn release(&self, generation: u64) {
        let now = self.clock.utc();
        let mut guard = self.lock();
        self.refresh(&mut guard, now);
        if guard.generation == generation {
            guard.counts.on_abandon();
        }
    }

    fn ready_to_trip(&self, counts: Counts) -> bool {
        if counts.requests < self.config.min_requests {
            return false;
        }
        let failures = u64::from(counts.total_failures).saturating_mul(100);
        let threshold =
            u64::from(counts.requests).saturating_mul(u64::from(self.config.failure_ratio_percent));
        failures >= threshold
    }

    fn refresh(&self, state: &mut BreakerState, now: DateTime<Utc>) {
        let expired = state.expiry.is_some_and(|expiry| expiry <= now);
        match state.state {
            CircuitState::Closed if expired => Self::start_generation(&self.config, state, now),
            CircuitState::Open if expired => {
                self.transition(state, CircuitState::HalfOpen, now);
            }
            CircuitState::Closed | CircuitState::Open | CircuitState::HalfOpen => {}
        }
    }

    fn transition(&self, state: &mut BreakerState, target: CircuitState, now: DateTime<Utc>) {
        if state.state == target {
            return;
        }
        let previous = state.state;
        state.state = target;
        Self::start_generation(&self.config, state, now);

        if target == CircuitState::Open {
            warn!(
                breaker = %self.name,
                from = %previous,
                to = %target,
                "circuit breaker opened"
            );
        } else {
            info!(
                breaker = %self.name,
                from = %previous,
                to = %target,
                "circuit breaker state changed"
            );
        }
    }

    fn start_generation(
        config: &CircuitBreakerConfig,
        state: &mut BreakerState,
        now: DateTime<Utc>,
    ) {
        state.generation = state.generation.wrapping_add(1);
        state.counts.clear();
        state.expiry = match state.state {
            CircuitState::Closed if config.reset_interval_secs == 0 => None,
            CircuitState::Closed => Some(deadline_after(now, config.reset_interval())),
            CircuitState::Open => Some(deadline_after(now, config.open_timeout())),
            CircuitState::HalfOpen => None,
        };
    }
}

struct Admission<'a, C>
where
    C: Clock + Send + Sync,
{
    breaker: &'a CircuitBreaker<C>,
    generation: u64,
    settled: bool,
}

impl<C> Admission<'_, C>
where
    C: Clock + Send + Sync,
{
    fn settle(mut self, success: bool) {
        self.settled = true;
        self.breaker.record(self.generation, success);
    }
}

impl<C> Drop for Admission<'_, C>
where
    C: Clock + Send + Sync,
{
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release(self.generation);
        }
    }
}
