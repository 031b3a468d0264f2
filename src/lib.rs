//! Adaptive client-side circuit breaker with probabilistic load shedding
//!
//! This crate guards calls to a remote dependency and sheds load when the
//! dependency degrades, Google-SRE client-throttling style:
//! - Rolling time-bucketed window of recent successes and totals
//! - Continuous drop probability instead of a binary trip, so admission
//!   recovers smoothly as the dependency heals
//! - Shared per-name breaker registry with lock-free reads
//! - Outcome classification (plain / ignore / drop) and ordered fallback chains
//!
//! # Example
//!
//! ```rust
//! use adaptive_breaker::{CallOptions, Failure, Registry};
//!
//! let registry = Registry::new();
//!
//! // A plain closure: success feeds the breaker's health statistics.
//! let value = registry.call("billing", || Ok::<_, Failure<String>>(42)).unwrap();
//! assert_eq!(value, 42);
//!
//! // A failing call recovered by a fallback.
//! let result = registry.call(
//!     "billing",
//!     (
//!         || Err::<i32, _>(Failure::Error("downstream unavailable".to_string())),
//!         CallOptions::new().with_fallback(|_err| Ok(0)),
//!     ),
//! );
//! assert_eq!(result.unwrap(), 0);
//! ```

pub mod adaptive;
pub mod builder;
pub mod call;
pub mod errors;
pub mod registry;
pub mod window;

pub use adaptive::{AdaptiveBreaker, Breaker, Config, StateChangeFn};
pub use builder::BreakerBuilder;
pub use call::{CallFn, CallOptions, Failure, FallbackFn, IntoCallOptions, call};
pub use errors::{BreakerError, ConfigError, Rejected};
pub use registry::{Registry, default_registry};
pub use window::RollingWindow;

/// Logical breaker state, exposed for observation and state-change hooks.
///
/// The adaptive algorithm never branches on this value; it recomputes a drop
/// probability on every call. `HalfOpen` exists for probing strategies behind
/// the same [`Breaker`] trait and is never entered by [`AdaptiveBreaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl State {
    pub(crate) fn from_u8(raw: u8) -> State {
        match raw {
            1 => State::Open,
            2 => State::HalfOpen,
            _ => State::Closed,
        }
    }
}
