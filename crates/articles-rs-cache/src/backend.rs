//! Cache backends.
//!
//! ## Backends
//!
//! - [`InMemoryCache`] - Thread-safe in-memory cache with TTL support
//! - [`DummyCache`] - Stores nothing; every read misses
//!
//! ## Usage
//!
//! ```
//! use articles_rs_cache::{CacheBackend, CacheValue, InMemoryCache};
//!
//! let cache = InMemoryCache::new();
//! cache.set("key", CacheValue::String("hello".to_string()), None).unwrap();
//! assert_eq!(cache.get("key").unwrap(), Some(CacheValue::String("hello".to_string())));
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use articles_rs_core::settings::CacheSettings;
use articles_rs_core::{ArticlesError, ArticlesResult};

/// A value that can be stored in a cache backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheValue {
    /// A string value.
    String(String),
    /// A 64-bit integer value.
    Integer(i64),
    /// A JSON value.
    Json(serde_json::Value),
}

impl CacheValue {
    /// Returns the value as a string, if it is a `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is an `Integer` variant.
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as JSON, if it is a `Json` variant.
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }
}

/// A backend for storing and retrieving cached values.
///
/// Shared between concurrent requests; implementations must be `Send + Sync`.
pub trait CacheBackend: Send + Sync {
    /// Retrieves a value; `None` if the key does not exist or has expired.
    fn get(&self, key: &str) -> ArticlesResult<Option<CacheValue>>;

    /// Stores a value with an optional TTL. `None` never expires.
    fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> ArticlesResult<()>;

    /// Deletes a value. Returns `true` if the key existed.
    fn delete(&self, key: &str) -> ArticlesResult<bool>;

    /// Removes all entries.
    fn clear(&self) -> ArticlesResult<()>;

    /// Checks whether a live entry exists for `key`.
    fn has_key(&self, key: &str) -> ArticlesResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Increments an integer value by `delta` and returns the new value.
    ///
    /// # Errors
    ///
    /// Fails with [`ArticlesError::CacheError`] if the key is missing,
    /// expired, or not an integer.
    fn incr(&self, key: &str, delta: i64) -> ArticlesResult<i64>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CacheValue,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

fn poisoned<T>(_: T) -> ArticlesError {
    ArticlesError::CacheError("cache lock poisoned".to_string())
}

/// A thread-safe in-memory cache with TTL support.
///
/// Expired entries are skipped on read and purged on the next write. Clones
/// share the same store.
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
    default_ttl: Option<Duration>,
    key_prefix: String,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCache {
    /// Creates a new empty in-memory cache without a default TTL.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            default_ttl: None,
            key_prefix: String::new(),
        }
    }

    /// Sets the TTL applied when `set` is called without one.
    #[must_use]
    pub const fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Namespaces every key as `"{prefix}:{key}"`. An empty prefix leaves
    /// keys untouched.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn make_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{key}", self.key_prefix)
        }
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.store
            .read()
            .map(|store| store.values().filter(|e| !e.is_expired()).count())
            .unwrap_or(0)
    }

    /// Returns `true` if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for InMemoryCache {
    fn get(&self, key: &str) -> ArticlesResult<Option<CacheValue>> {
        let store = self.store.read().map_err(poisoned)?;
        Ok(store
            .get(&self.make_key(key))
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> ArticlesResult<()> {
        let mut store = self.store.write().map_err(poisoned)?;
        store.retain(|_, entry| !entry.is_expired());
        let expires_at = ttl.or(self.default_ttl).map(|d| Instant::now() + d);
        store.insert(self.make_key(key), CacheEntry { value, expires_at });
        Ok(())
    }

    fn delete(&self, key: &str) -> ArticlesResult<bool> {
        let mut store = self.store.write().map_err(poisoned)?;
        Ok(store.remove(&self.make_key(key)).is_some())
    }

    fn clear(&self) -> ArticlesResult<()> {
        self.store.write().map_err(poisoned)?.clear();
        Ok(())
    }

    fn incr(&self, key: &str, delta: i64) -> ArticlesResult<i64> {
        let mut store = self.store.write().map_err(poisoned)?;
        let entry = store
            .get_mut(&self.make_key(key))
            .filter(|entry| !entry.is_expired())
            .ok_or_else(|| ArticlesError::CacheError(format!("Cache key '{key}' does not exist")))?;

        match entry.value {
            CacheValue::Integer(current) => {
                let new_value = current + delta;
                entry.value = CacheValue::Integer(new_value);
                Ok(new_value)
            }
            _ => Err(ArticlesError::CacheError(format!(
                "Cache key '{key}' is not an integer"
            ))),
        }
    }
}

/// A cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyCache;

impl CacheBackend for DummyCache {
    fn get(&self, _key: &str) -> ArticlesResult<Option<CacheValue>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: CacheValue, _ttl: Option<Duration>) -> ArticlesResult<()> {
        Ok(())
    }

    fn delete(&self, _key: &str) -> ArticlesResult<bool> {
        Ok(false)
    }

    fn clear(&self) -> ArticlesResult<()> {
        Ok(())
    }

    fn incr(&self, key: &str, _delta: i64) -> ArticlesResult<i64> {
        Err(ArticlesError::CacheError(format!(
            "Cache key '{key}' does not exist"
        )))
    }
}

/// Builds the backend named in `settings.backend`.
///
/// # Errors
///
/// Returns [`ArticlesError::ImproperlyConfigured`] for unknown backends.
pub fn backend_from_settings(settings: &CacheSettings) -> ArticlesResult<Arc<dyn CacheBackend>> {
    match settings.backend.as_str() {
        "locmem" => Ok(Arc::new(
            InMemoryCache::new()
                .with_default_ttl(settings.timeout.map(Duration::from_secs))
                .with_key_prefix(settings.key_prefix.clone()),
        )),
        "dummy" => Ok(Arc::new(DummyCache)),
        other => Err(ArticlesError::ImproperlyConfigured(format!(
            "Unknown cache backend '{other}' (expected 'locmem' or 'dummy')"
        ))),
    }
}
