// aidis-db/src/breaker.rs
// ============================================================================
// Module: Circuit Breaker
// Description: Closed/open/half-open breaker for the database gateway.
// Purpose: Short-circuit database calls after repeated failures.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The breaker sits in front of every gateway call. Consecutive failures
//! trip it open; while open, calls short-circuit without touching the
//! database. Once the recovery window elapses, exactly one probe call is
//! admitted: success closes the breaker, failure re-opens it and resets
//! the window.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::Instant;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Breaker state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// All calls pass.
    Closed,
    /// Calls short-circuit until the recovery window elapses.
    Open,
    /// One probe call is in flight.
    HalfOpen,
}

impl BreakerState {
    /// Returns the stable label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

/// Observable breaker statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    /// Current state.
    pub state: BreakerState,
    /// Consecutive failure count while closed.
    pub consecutive_failures: u32,
}

/// Ticket returned for an admitted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerPass {
    /// True when this call is the half-open probe.
    pub probe: bool,
}

/// Guarded breaker internals.
#[derive(Debug)]
struct BreakerInner {
    /// Current state.
    state: BreakerState,
    /// Consecutive failure count while closed.
    consecutive_failures: u32,
    /// When the breaker last opened.
    opened_at: Option<Instant>,
}

/// Circuit breaker protecting the database gateway.
///
/// # Invariants
/// - At most one probe call is admitted per recovery window.
/// - Counter updates happen under the guard; readers never observe a torn
///   state transition.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Guarded state.
    inner: Mutex<BreakerInner>,
    /// Consecutive failures that trip the breaker open.
    threshold: u32,
    /// Recovery window before a probe is admitted.
    recovery: Duration,
}

impl CircuitBreaker {
    /// Creates a closed breaker.
    #[must_use]
    pub const fn new(threshold: u32, recovery: Duration) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
            threshold,
            recovery,
        }
    }

    /// Acquires the guard, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Admits or rejects a call.
    ///
    /// # Errors
    ///
    /// Returns `Err(())` while the breaker is open or a probe is already
    /// in flight.
    pub fn try_acquire(&self) -> Result<BreakerPass, ()> {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => Ok(BreakerPass {
                probe: false,
            }),
            BreakerState::Open => {
                let elapsed = inner.opened_at.map(|at| at.elapsed()).unwrap_or_default();
                if elapsed < self.recovery {
                    return Err(());
                }
                inner.state = BreakerState::HalfOpen;
                Ok(BreakerPass {
                    probe: true,
                })
            }
            BreakerState::HalfOpen => Err(()),
        }
    }

    /// Records a successful call.
    pub fn on_success(&self) {
        let mut inner = self.lock();
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    /// Records a failed call.
    pub fn on_failure(&self) {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::HalfOpen => {
                // Failed probe re-opens and restarts the recovery window.
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
            }
            BreakerState::Closed => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                if inner.consecutive_failures >= self.threshold {
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            BreakerState::Open => {}
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    /// Returns observable statistics.
    #[must_use]
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
