//! The app-reverse cache generation.
//!
//! Reverse cache entries are never deleted one by one. Every key embeds the
//! current generation, so bumping the counter makes all earlier entries
//! unreachable at once.

use std::sync::Arc;

use articles_rs_core::{ArticlesError, ArticlesResult};

use crate::backend::{CacheBackend, CacheValue};

/// Cache key holding the generation counter.
pub const APP_REVERSE_CACHE_GENERATION_KEY: &str = "app_reverse_cache_generation";

/// A shared, monotonically increasing version stamp.
pub trait GenerationRegistry: Send + Sync {
    /// Returns the current generation, or `None` if it was never set or has
    /// been evicted.
    fn current(&self) -> ArticlesResult<Option<u64>>;

    /// Advances the generation and returns the new value.
    fn bump(&self) -> ArticlesResult<u64>;
}

/// A [`GenerationRegistry`] stored in a cache backend under
/// [`APP_REVERSE_CACHE_GENERATION_KEY`].
#[derive(Clone)]
pub struct CacheGeneration {
    cache: Arc<dyn CacheBackend>,
}

impl std::fmt::Debug for CacheGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheGeneration")
            .field("key", &APP_REVERSE_CACHE_GENERATION_KEY)
            .finish_non_exhaustive()
    }
}

impl CacheGeneration {
    /// Creates a registry backed by `cache`.
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self { cache }
    }
}

fn to_generation(value: i64) -> ArticlesResult<u64> {
    u64::try_from(value).map_err(|_| {
        ArticlesError::CacheError(format!("Negative cache generation {value}"))
    })
}

impl GenerationRegistry for CacheGeneration {
    fn current(&self) -> ArticlesResult<Option<u64>> {
        match self.cache.get(APP_REVERSE_CACHE_GENERATION_KEY)? {
            Some(CacheValue::Integer(value)) => to_generation(value).map(Some),
            Some(other) => Err(ArticlesError::CacheError(format!(
                "Cache generation has unexpected value {other:?}"
            ))),
            None => Ok(None),
        }
    }

    fn bump(&self) -> ArticlesResult<u64> {
        if self.cache.has_key(APP_REVERSE_CACHE_GENERATION_KEY)? {
            return to_generation(self.cache.incr(APP_REVERSE_CACHE_GENERATION_KEY, 1)?);
        }
        // Seeded from the clock: a restarted process must not reuse
        // generations left behind in a shared cache.
        let seed = chrono::Utc::now().timestamp_millis();
        self.cache.set(
            APP_REVERSE_CACHE_GENERATION_KEY,
            CacheValue::Integer(seed),
            None,
        )?;
        to_generation(seed)
    }
}

/// Invalidates every reverse cache entry.
///
/// Connected to content change signals; failures are logged rather than
/// returned so that a cache outage never blocks a save.
pub fn cycle_app_reverse_cache(generation: &dyn GenerationRegistry) {
    match generation.bump() {
        Ok(value) => tracing::debug!(generation = value, "app reverse cache cycled"),
        Err(err) => tracing::warn!(error = %err, "could not cycle app reverse cache"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DummyCache, InMemoryCache};

    #[test]
    fn test_current_absent_initially() {
        let generation = CacheGeneration::new(Arc::new(InMemoryCache::new()));
        assert_eq!(generation.current().unwrap(), None);
    }

    #[test]
    fn test_bump_seeds_then_increments() {
        let generation = CacheGeneration::new(Arc::new(InMemoryCache::new()));
        let first = generation.bump().unwrap();
        assert!(first > 0);
        assert_eq!(generation.current().unwrap(), Some(first));
        assert_eq!(generation.bump().unwrap(), first + 1);
        assert_eq!(generation.current().unwrap(), Some(first + 1));
    }

    #[test]
    fn test_existing_counter_is_incremented() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set(APP_REVERSE_CACHE_GENERATION_KEY, CacheValue::Integer(7), None)
            .unwrap();
        let generation = CacheGeneration::new(cache);
        assert_eq!(generation.bump().unwrap(), 8);
    }

    #[test]
    fn test_dummy_cache_never_remembers() {
        let generation = CacheGeneration::new(Arc::new(DummyCache));
        assert!(generation.bump().is_ok());
        assert_eq!(generation.current().unwrap(), None);
    }

    #[test]
    fn test_unexpected_value_is_error() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set(
                APP_REVERSE_CACHE_GENERATION_KEY,
                CacheValue::String("x".into()),
                None,
            )
            .unwrap();
        let generation = CacheGeneration::new(cache);
        assert!(generation.current().is_err());
    }

    #[test]
    fn test_cycle_swallows_errors() {
        struct Failing;
        impl GenerationRegistry for Failing {
            fn current(&self) -> ArticlesResult<Option<u64>> {
                Ok(None)
            }
            fn bump(&self) -> ArticlesResult<u64> {
                Err(ArticlesError::CacheError("down".into()))
            }
        }
        cycle_app_reverse_cache(&Failing);
    }
}
