//! Shared per-name breaker registry
//!
//! Many call sites share one breaker per logical operation name. Lookups hit
//! an immutable snapshot behind an atomically swappable handle, so readers
//! never block; first-use construction serializes on a separate write mutex
//! and publishes a complete new snapshot. Snapshots only ever grow.

use crate::adaptive::{AdaptiveBreaker, Breaker, Config};
use crate::errors::ConfigError;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::debug;

type Snapshot = HashMap<String, Arc<dyn Breaker>>;

/// Factory invoked under the write lock to build the breaker for a new name.
pub type FactoryFn = Arc<dyn Fn(&str) -> Arc<dyn Breaker> + Send + Sync>;

/// Concurrent mapping from logical name to a shared breaker instance.
pub struct Registry {
    snapshot: ArcSwap<Snapshot>,
    write: Mutex<()>,
    factory: FactoryFn,
}

impl Registry {
    /// Registry producing adaptive breakers with the default configuration.
    pub fn new() -> Self {
        Self::with_factory(|_| Arc::new(AdaptiveBreaker::from_config(Config::default())))
    }

    /// Registry producing adaptive breakers from the given configuration.
    ///
    /// The configuration is validated once here; every breaker the registry
    /// constructs shares it.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_factory(move |_| {
            Arc::new(AdaptiveBreaker::from_config(config.clone()))
        }))
    }

    /// Registry with a custom factory, e.g. for an alternative breaker
    /// strategy or per-name configuration.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn(&str) -> Arc<dyn Breaker> + Send + Sync + 'static,
    {
        Self {
            snapshot: ArcSwap::from_pointee(HashMap::new()),
            write: Mutex::new(()),
            factory: Arc::new(factory),
        }
    }

    /// Resolve the breaker for `name`, constructing it on first use.
    ///
    /// At most one breaker is ever constructed per name; concurrent readers
    /// see either the old or the new snapshot, never a partial one.
    pub fn get(&self, name: &str) -> Arc<dyn Breaker> {
        if let Some(breaker) = self.snapshot.load().get(name) {
            return Arc::clone(breaker);
        }

        let _guard = self.write.lock().unwrap();
        // Another caller may have inserted while we waited for the lock.
        let current = self.snapshot.load_full();
        if let Some(breaker) = current.get(name) {
            return Arc::clone(breaker);
        }

        debug!(name, "creating breaker on first use");
        let breaker = (self.factory)(name);
        let mut next: Snapshot = (*current).clone();
        next.insert(name.to_string(), Arc::clone(&breaker));
        self.snapshot.store(Arc::new(next));
        breaker
    }

    /// Number of breakers constructed so far.
    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    /// True if no breaker has been constructed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.len())
            .finish()
    }
}

/// Process-wide default registry used by the free [`call`](crate::call())
/// function. Prefer an explicit [`Registry`] where test isolation matters.
pub fn default_registry() -> &'static Registry {
    static DEFAULT: OnceLock<Registry> = OnceLock::new();
    DEFAULT.get_or_init(Registry::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_same_name_yields_same_instance() {
        let registry = Registry::new();

        let first = registry.get("api");
        let second = registry.get("api");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_names_grow_monotonically() {
        let registry = Registry::new();

        registry.get("api");
        registry.get("db");
        registry.get("api");

        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_concurrent_get_constructs_exactly_once() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructions);

        let registry = Arc::new(Registry::with_factory(move |_name| {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(AdaptiveBreaker::from_config(Config::default()))
        }));

        let barrier = Arc::new(Barrier::new(16));
        let mut handles = vec![];
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                registry.get("shared")
            }));
        }

        let breakers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        for breaker in &breakers[1..] {
            assert!(Arc::ptr_eq(&breakers[0], breaker));
        }
    }

    #[test]
    fn test_with_config_validates_once() {
        let result = Registry::with_config(Config {
            success_ratio: -1.0,
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::SuccessRatio(_))));
    }

    #[test]
    fn test_factory_receives_name() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let names = Arc::clone(&seen);

        let registry = Registry::with_factory(move |name| {
            names.lock().unwrap().push(name.to_string());
            Arc::new(AdaptiveBreaker::from_config(Config::default()))
        });

        registry.get("payments");
        registry.get("search");
        registry.get("payments");

        assert_eq!(*seen.lock().unwrap(), vec!["payments", "search"]);
    }

    #[test]
    fn test_default_registry_is_shared() {
        let first = default_registry().get("default_registry_shared");
        let second = default_registry().get("default_registry_shared");
        assert!(Arc::ptr_eq(&first, &second));
    }
}
