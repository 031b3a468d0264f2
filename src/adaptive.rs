//! Adaptive breaker implementing Google-SRE-style client throttling
//!
//! Instead of tripping on a discrete threshold, the breaker recomputes a drop
//! probability from the rolling window on every admission check. The
//! probability rises as failures accumulate and falls as successes return, so
//! admission degrades and recovers smoothly without a half-open probe phase.

use crate::State;
use crate::errors::{ConfigError, Rejected};
use crate::window::RollingWindow;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tracing::debug;

/// Hook invoked with `(old, new)` on logical state transitions.
pub type StateChangeFn = std::sync::Arc<dyn Fn(State, State) + Send + Sync>;

/// Breaker configuration
#[derive(Clone)]
pub struct Config {
    /// Target success ratio in `(0, 1]`. The admission threshold is
    /// `successes / success_ratio`; traffic at or above the target is never
    /// shed.
    pub success_ratio: f64,

    /// Volume floor: below this many requests in the window, no shedding
    /// occurs regardless of the failure rate.
    pub min_requests: u64,

    /// Duration of the trailing accounting window.
    pub window: Duration,

    /// Number of buckets the window is divided into.
    pub bucket_count: usize,

    /// Optional hook fired on `Closed` <-> `Open` transitions.
    pub on_state_change: Option<StateChangeFn>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            success_ratio: 0.5,
            min_requests: 50,
            window: Duration::from_secs(3),
            bucket_count: 10,
            on_state_change: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("success_ratio", &self.success_ratio)
            .field("min_requests", &self.min_requests)
            .field("window", &self.window)
            .field("bucket_count", &self.bucket_count)
            .field("on_state_change", &self.on_state_change.is_some())
            .finish()
    }
}

impl Config {
    /// Reject malformed configuration at construction time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.success_ratio > 0.0 && self.success_ratio <= 1.0) {
            return Err(ConfigError::SuccessRatio(self.success_ratio));
        }
        if self.bucket_count == 0 {
            return Err(ConfigError::BucketCount);
        }
        // Each bucket must span at least one nanosecond, or the ring cannot
        // index by time. Covers the zero-duration window as well.
        if self.window.as_nanos() < self.bucket_count as u128 {
            return Err(ConfigError::Window);
        }
        Ok(())
    }
}

/// Capability contract shared by breaker strategies.
///
/// All three operations must be safe to invoke concurrently on a shared
/// instance. Calls rejected by [`allow`](Breaker::allow) never reached user
/// code and must not be marked.
pub trait Breaker: Send + Sync {
    /// Decide whether a call may proceed.
    fn allow(&self) -> Result<(), Rejected>;

    /// Record a call that ran and succeeded.
    fn mark_success(&self);

    /// Record a call that ran and failed.
    fn mark_failed(&self);
}

/// Adaptive breaker over one rolling window.
pub struct AdaptiveBreaker {
    window: RollingWindow,
    /// `1 / success_ratio`, precomputed at construction.
    k: f64,
    min_requests: u64,
    /// StdRng is not safe to share; the lock section covers one uniform draw.
    rng: Mutex<StdRng>,
    /// Observed logical state; the algorithm itself never branches on it.
    state: AtomicU8,
    on_state_change: Option<StateChangeFn>,
}

impl AdaptiveBreaker {
    /// Create a breaker, validating the configuration.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    /// Create a new breaker builder.
    pub fn builder() -> crate::builder::BreakerBuilder {
        crate::builder::BreakerBuilder::new()
    }

    /// Construct from an already-validated configuration.
    pub(crate) fn from_config(config: Config) -> Self {
        Self {
            window: RollingWindow::new(config.window, config.bucket_count),
            k: 1.0 / config.success_ratio,
            min_requests: config.min_requests,
            rng: Mutex::new(StdRng::from_entropy()),
            state: AtomicU8::new(State::Closed as u8),
            on_state_change: config.on_state_change,
        }
    }

    /// Current observed state.
    pub fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Check if the breaker is observed open (shedding regime).
    pub fn is_open(&self) -> bool {
        self.state() == State::Open
    }

    /// Check if the breaker is observed closed.
    pub fn is_closed(&self) -> bool {
        self.state() == State::Closed
    }

    /// Current `(success, total)` counts inside the window.
    pub fn summary(&self) -> (u64, u64) {
        self.window.summary()
    }

    /// Flip the observed state and fire the hook, once per transition.
    fn transition(&self, from: State, to: State) {
        if self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            debug!(?from, ?to, "breaker state changed");
            if let Some(hook) = &self.on_state_change {
                hook(from, to);
            }
        }
    }
}

impl std::fmt::Debug for AdaptiveBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveBreaker")
            .field("k", &self.k)
            .field("min_requests", &self.min_requests)
            .field("state", &self.state())
            .field("window", &self.window)
            .finish()
    }
}

impl Breaker for AdaptiveBreaker {
    fn allow(&self) -> Result<(), Rejected> {
        let (success, total) = self.window.summary();
        let weighted = self.k * success as f64;

        // Under the volume floor, or comfortably healthy: admit outright.
        if total < self.min_requests || (total as f64) < weighted {
            self.transition(State::Open, State::Closed);
            return Ok(());
        }

        self.transition(State::Closed, State::Open);

        // `total + 1` keeps the ratio finite when min_requests is 0.
        let drop_ratio = ((total as f64 - weighted) / (total + 1) as f64).max(0.0);
        let draw = self.rng.lock().unwrap().gen_range(0.0..1.0);
        if draw < drop_ratio {
            debug!(success, total, drop_ratio, "shedding call");
            Err(Rejected)
        } else {
            Ok(())
        }
    }

    fn mark_success(&self) {
        self.window.add(true);
    }

    fn mark_failed(&self) {
        self.window.add(false);
    }
}
