//! # articles-rs-cache
//!
//! Server-side caching for articles-rs.
//!
//! - [`backend`]: the [`CacheBackend`] trait with [`InMemoryCache`] and [`DummyCache`]
//! - [`generation`]: the version stamp that invalidates every reverse cache entry at once

pub mod backend;
pub mod generation;

pub use backend::{backend_from_settings, CacheBackend, CacheValue, DummyCache, InMemoryCache};
pub use generation::{
    cycle_app_reverse_cache, CacheGeneration, GenerationRegistry, APP_REVERSE_CACHE_GENERATION_KEY,
};
