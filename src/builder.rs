//! Builder API for ergonomic breaker configuration

use crate::State;
use crate::adaptive::{AdaptiveBreaker, Config};
use crate::errors::ConfigError;
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating adaptive breakers with a fluent API.
pub struct BreakerBuilder {
    config: Config,
}

impl BreakerBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the target success ratio in `(0, 1]`.
    ///
    /// Traffic whose success ratio stays at or above the target is never
    /// shed. Validated by [`build`](Self::build).
    pub fn success_ratio(mut self, ratio: f64) -> Self {
        self.config.success_ratio = ratio;
        self
    }

    /// Set the volume floor below which no shedding occurs.
    pub fn min_requests(mut self, requests: u64) -> Self {
        self.config.min_requests = requests;
        self
    }

    /// Set the trailing window duration.
    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    /// Set the number of buckets the window is divided into.
    pub fn bucket_count(mut self, count: usize) -> Self {
        self.config.bucket_count = count;
        self
    }

    /// Set a hook fired with `(old, new)` on state transitions.
    pub fn on_state_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(State, State) + Send + Sync + 'static,
    {
        self.config.on_state_change = Some(Arc::new(hook));
        self
    }

    /// Build the breaker, rejecting malformed configuration.
    pub fn build(self) -> Result<AdaptiveBreaker, ConfigError> {
        AdaptiveBreaker::new(self.config)
    }
}

impl Default for BreakerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::Breaker;

    #[test]
    fn test_builder_defaults() {
        let breaker = BreakerBuilder::new().build().unwrap();

        assert!(breaker.is_closed());
        assert_eq!(breaker.summary(), (0, 0));
    }

    #[test]
    fn test_builder_custom_config() {
        let breaker = BreakerBuilder::new()
            .success_ratio(0.8)
            .min_requests(100)
            .window(Duration::from_secs(10))
            .bucket_count(20)
            .build()
            .unwrap();

        assert!(breaker.is_closed());
    }

    #[test]
    fn test_builder_rejects_bad_ratio() {
        let result = BreakerBuilder::new().success_ratio(2.0).build();
        assert_eq!(result.unwrap_err(), ConfigError::SuccessRatio(2.0));
    }

    #[test]
    fn test_builder_with_state_hook() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let opened = Arc::new(AtomicBool::new(false));
        let opened_clone = Arc::clone(&opened);

        let breaker = AdaptiveBreaker::builder()
            .min_requests(5)
            .window(Duration::from_secs(60))
            .on_state_change(move |_old, new| {
                if new == State::Open {
                    opened_clone.store(true, Ordering::SeqCst);
                }
            })
            .build()
            .unwrap();

        for _ in 0..10 {
            breaker.mark_failed();
        }
        let _ = breaker.allow();

        assert!(opened.load(Ordering::SeqCst));
    }
}
