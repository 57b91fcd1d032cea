//! Circuit breaker guarding the downstream registration call.
//!
//! States:
//!
//! - **Closed**: normal operation, calls pass through
//! - **Open**: the breaker tripped; calls fail fast without touching the
//!   network until the cooldown elapses
//! - **HalfOpen**: cooldown elapsed; trial calls are allowed and decide
//!   whether the breaker closes again or re-opens

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u64,
    /// Cooldown before the open circuit admits a trial call
    pub open_duration: Duration,
    /// Successful trial calls required to close the circuit
    pub success_threshold: u64,
    /// Timeout applied to each guarded call
    pub call_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            success_threshold: 2,
            call_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    state: AtomicU8,
    consecutive_failures: AtomicU64,
    half_open_successes: AtomicU64,
    /// Epoch millis when the circuit opened, 0 while closed.
    opened_at_ms: AtomicU64,
}

/// Cloneable circuit breaker handle.
///
/// All clones share state, so one breaker can guard every call site that
/// targets the same dependency.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    name: String,
    config: Arc<CircuitBreakerConfig>,
    state: Arc<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            state: Arc::new(BreakerState::default()),
        }
    }

    /// Current state, transitioning Open to HalfOpen when the cooldown has
    /// elapsed.
    pub fn state(&self) -> CircuitState {
        let current = CircuitState::from(self.state.state.load(Ordering::SeqCst));
        if current == CircuitState::Open {
            let opened_at_ms = self.state.opened_at_ms.load(Ordering::SeqCst);
            if opened_at_ms > 0 && now_ms().saturating_sub(opened_at_ms) >= millis(self.config.open_duration) {
                self.state
                    .state
                    .store(CircuitState::HalfOpen as u8, Ordering::SeqCst);
                self.state.half_open_successes.store(0, Ordering::SeqCst);
                info!(name = %self.name, "circuit breaker half-open, admitting trial calls");
                return CircuitState::HalfOpen;
            }
        }
        current
    }

    /// Whether a call may go through right now.
    pub fn allow_request(&self) -> bool {
        self.state() != CircuitState::Open
    }

    fn record_success(&self) {
        match CircuitState::from(self.state.state.load(Ordering::SeqCst)) {
            CircuitState::HalfOpen => {
                let successes = self.state.half_open_successes.fetch_add(1, Ordering::SeqCst) + 1;
                if successes >= self.config.success_threshold {
                    self.state
                        .state
                        .store(CircuitState::Closed as u8, Ordering::SeqCst);
                    self.state.consecutive_failures.store(0, Ordering::SeqCst);
                    self.state.opened_at_ms.store(0, Ordering::SeqCst);
                    info!(name = %self.name, "circuit breaker closed");
                }
            }
            _ => {
                self.state.consecutive_failures.store(0, Ordering::SeqCst);
            }
        }
    }

    fn record_failure(&self) {
        let failures = self.state.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        match CircuitState::from(self.state.state.load(Ordering::SeqCst)) {
            CircuitState::Closed => {
                if failures >= self.config.failure_threshold {
                    self.trip();
                }
            }
            // Any failure during the trial re-opens immediately.
            CircuitState::HalfOpen => self.trip(),
            CircuitState::Open => {}
        }
    }

    fn trip(&self) {
        self.state
            .state
            .store(CircuitState::Open as u8, Ordering::SeqCst);
        self.state.opened_at_ms.store(now_ms(), Ordering::SeqCst);
        warn!(
            name = %self.name,
            consecutive_failures = self.state.consecutive_failures.load(Ordering::SeqCst),
            "circuit breaker opened"
        );
    }

    /// Run `operation` under breaker protection and the configured timeout.
    ///
    /// Fails fast with [`CircuitBreakerError::Open`] when the circuit is
    /// open; otherwise the outcome (including timeout) is recorded and
    /// returned.
    pub async fn execute<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        if !self.allow_request() {
            return Err(CircuitBreakerError::Open);
        }

        match tokio::time::timeout(self.config.call_timeout, operation).await {
            Ok(Ok(value)) => {
                self.record_success();
                Ok(value)
            }
            Ok(Err(error)) => {
                self.record_failure();
                Err(CircuitBreakerError::Failed(error))
            }
            Err(_) => {
                self.record_failure();
                Err(CircuitBreakerError::Timeout)
            }
        }
    }
}

/// Errors produced by a guarded call.
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("circuit breaker is open")]
    Open,

    #[error("guarded call timed out")]
    Timeout,

    #[error("guarded call failed: {0}")]
    Failed(E),
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn breaker(failure_threshold: u64, open_ms: u64, success_threshold: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig {
                failure_threshold,
                open_duration: Duration::from_millis(open_ms),
                success_threshold,
                call_timeout: Duration::from_millis(200),
            },
        )
    }

    async fn fail(b: &CircuitBreaker) {
        let _ = b.execute(async { Err::<(), _>("boom") }).await;
    }

    async fn succeed(b: &CircuitBreaker) {
        let _ = b.execute(async { Ok::<_, &str>(()) }).await;
    }

    #[tokio::test]
    async fn closed_by_default() {
        let b = breaker(5, 1000, 2);
        assert_eq!(b.state(), CircuitState::Closed);
        assert!(b.allow_request());
    }

    #[tokio::test]
    async fn opens_after_consecutive_failures() {
        let b = breaker(3, 1000, 2);
        for _ in 0..3 {
            fail(&b).await;
        }
        assert_eq!(b.state(), CircuitState::Open);

        // Fails fast without running the operation.
        let ran = std::sync::atomic::AtomicU64::new(0);
        let result = b
            .execute(async {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok::<_, &str>(())
            })
            .await;
        assert!(matches!(result, Err(CircuitBreakerError::Open)));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_resets_the_failure_streak() {
        let b = breaker(3, 1000, 2);
        fail(&b).await;
        fail(&b).await;
        succeed(&b).await;
        fail(&b).await;
        fail(&b).await;
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_after_cooldown_then_closes_on_successes() {
        let b = breaker(1, 50, 2);
        fail(&b).await;
        assert_eq!(b.state(), CircuitState::Open);

        sleep(Duration::from_millis(80)).await;
        assert_eq!(b.state(), CircuitState::HalfOpen);

        succeed(&b).await;
        assert_eq!(b.state(), CircuitState::HalfOpen);
        succeed(&b).await;
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_failure_reopens() {
        let b = breaker(1, 50, 1);
        fail(&b).await;
        sleep(Duration::from_millis(80)).await;
        assert_eq!(b.state(), CircuitState::HalfOpen);
        fail(&b).await;
        assert_eq!(b.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn timeouts_count_as_failures() {
        let b = breaker(1, 1000, 1);
        let result = b
            .execute(async {
                sleep(Duration::from_secs(5)).await;
                Ok::<_, &str>(())
            })
            .await;
        assert!(matches!(result, Err(CircuitBreakerError::Timeout)));
        assert_eq!(b.state(), CircuitState::Open);
    }
}
