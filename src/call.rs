//! Call orchestration: outcome classification and fallback chains
//!
//! The orchestrated path resolves the named breaker, asks it for admission,
//! runs user code, classifies the returned outcome, feeds the breaker, and on
//! failure walks an ordered fallback chain. Exactly one of
//! `mark_success` / `mark_failed` / neither happens per call.

use crate::errors::BreakerError;
use crate::registry::{Registry, default_registry};
use tracing::debug;

/// Classification of a failed call, decided where user code returns.
///
/// The wrapped error is always surfaced to the caller unchanged; the tag only
/// controls breaker accounting and fallback handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure<E> {
    /// A real failure: counts against the breaker and triggers the fallback
    /// chain.
    Error(E),

    /// Health-neutral failure (e.g. a validation error): recorded as a
    /// success, no fallbacks.
    Ignore(E),

    /// Excluded from statistics entirely (e.g. caller cancellation), no
    /// fallbacks.
    Drop(E),
}

/// Type alias for the protected user function.
pub type CallFn<T, E> = Box<dyn FnOnce() -> Result<T, Failure<E>>>;

/// Type alias for a fallback function, invoked with the original error.
///
/// Carries the same (lack of) threading bound as [`CallFn`]: the whole chain
/// runs synchronously on the calling thread.
pub type FallbackFn<T, E> = Box<dyn FnOnce(&BreakerError<E>) -> Result<T, E>>;

/// Options for orchestrated calls.
pub struct CallOptions<T, E> {
    /// Ordered fallback chain, consulted after a shed call or a plain
    /// failure. The first fallback returning `Ok` short-circuits.
    pub fallbacks: Vec<FallbackFn<T, E>>,
}

impl<T, E> Default for CallOptions<T, E> {
    fn default() -> Self {
        Self {
            fallbacks: Vec::new(),
        }
    }
}

impl<T, E> CallOptions<T, E> {
    /// Create new call options with an empty fallback chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fallback to the chain.
    pub fn with_fallback<F>(mut self, fallback: F) -> Self
    where
        F: FnOnce(&BreakerError<E>) -> Result<T, E> + 'static,
    {
        self.fallbacks.push(Box::new(fallback));
        self
    }
}

/// Trait for converting into call options - allows a flexible `call()` API.
pub trait IntoCallOptions<T, E> {
    fn into_call_options(self) -> (CallFn<T, E>, CallOptions<T, E>);
}

/// Implement for plain closures.
impl<T, E, F> IntoCallOptions<T, E> for F
where
    F: FnOnce() -> Result<T, Failure<E>> + 'static,
{
    fn into_call_options(self) -> (CallFn<T, E>, CallOptions<T, E>) {
        (Box::new(self), CallOptions::default())
    }
}

/// Implement for (closure, CallOptions) tuples.
impl<T, E, F> IntoCallOptions<T, E> for (F, CallOptions<T, E>)
where
    F: FnOnce() -> Result<T, Failure<E>> + 'static,
{
    fn into_call_options(self) -> (CallFn<T, E>, CallOptions<T, E>) {
        (Box::new(self.0), self.1)
    }
}

impl Registry {
    /// Execute a fallible operation behind the breaker registered for `name`.
    ///
    /// Accepts either:
    /// - A plain closure: `registry.call("api", || api_request())`
    /// - A closure with options:
    ///   `registry.call("api", (|| api_request(), CallOptions::new().with_fallback(...)))`
    ///
    /// The closure's error is a [`Failure`] tag; see its variants for how each
    /// affects breaker accounting. Fallbacks run in order with the original
    /// error; if none recover, the last fallback's error is returned (or the
    /// original when the chain is empty).
    pub fn call<I, T, E: 'static>(&self, name: &str, input: I) -> Result<T, BreakerError<E>>
    where
        I: IntoCallOptions<T, E>,
    {
        let (f, options) = input.into_call_options();
        let breaker = self.get(name);

        let original = match breaker.allow() {
            Ok(()) => match f() {
                Ok(value) => {
                    breaker.mark_success();
                    return Ok(value);
                }
                Err(Failure::Ignore(e)) => {
                    breaker.mark_success();
                    return Err(BreakerError::Execution(e));
                }
                Err(Failure::Drop(e)) => {
                    return Err(BreakerError::Execution(e));
                }
                Err(Failure::Error(e)) => {
                    breaker.mark_failed();
                    BreakerError::Execution(e)
                }
            },
            Err(rejected) => {
                debug!(name, "call shed by breaker");
                BreakerError::Rejected(rejected)
            }
        };

        let mut last = None;
        for fallback in options.fallbacks {
            match fallback(&original) {
                Ok(value) => return Ok(value),
                Err(e) => last = Some(e),
            }
        }
        match last {
            Some(e) => Err(BreakerError::Execution(e)),
            None => Err(original),
        }
    }
}

/// Execute a fallible operation on the process-wide default registry.
///
/// Convenience wrapper over [`Registry::call`]; prefer an explicit registry
/// where test isolation matters.
pub fn call<I, T, E: 'static>(name: &str, input: I) -> Result<T, BreakerError<E>>
where
    I: IntoCallOptions<T, E>,
{
    default_registry().call(name, input)
}
