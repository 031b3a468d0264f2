//! Error types for breaker operations

use thiserror::Error;

/// A call was shed by the breaker before user code ran.
///
/// This is the stable identity callers test for to distinguish shedding from
/// a downstream failure.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("circuit breaker is open: call not allowed")]
pub struct Rejected;

/// Errors surfaced by call orchestration.
///
/// Orchestration never swallows an error silently: every non-success call
/// returns either the shedding error or some execution error (original,
/// unwrapped ignore/drop, or the last fallback's).
#[derive(Debug, Error)]
pub enum BreakerError<E = Box<dyn std::error::Error + Send + Sync>> {
    /// The breaker shed the call; user code never ran.
    #[error(transparent)]
    Rejected(#[from] Rejected),

    /// User code failed, or every supplied fallback failed.
    #[error("execution failed: {0}")]
    Execution(E),
}

impl<E> BreakerError<E> {
    /// True when the call was shed rather than executed.
    pub fn is_rejected(&self) -> bool {
        matches!(self, BreakerError::Rejected(_))
    }
}

/// Construction-time configuration validation failures.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// `success_ratio` outside `(0, 1]`.
    #[error("success ratio must be in (0, 1], got {0}")]
    SuccessRatio(f64),

    /// Zero buckets cannot form a ring.
    #[error("bucket count must be at least 1")]
    BucketCount,

    /// The window is too short for its buckets (each bucket must span at
    /// least one nanosecond).
    #[error("window must span at least one nanosecond per bucket")]
    Window,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_is_distinguishable() {
        let err: BreakerError<String> = Rejected.into();
        assert!(err.is_rejected());

        let err: BreakerError<String> = BreakerError::Execution("boom".to_string());
        assert!(!err.is_rejected());
    }

    #[test]
    fn test_display_messages() {
        let err: BreakerError<&str> = BreakerError::Execution("boom");
        assert_eq!(err.to_string(), "execution failed: boom");

        let err: BreakerError<&str> = Rejected.into();
        assert_eq!(err.to_string(), "circuit breaker is open: call not allowed");
    }
}
