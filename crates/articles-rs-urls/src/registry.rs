//! Named URL configurations.
//!
//! Application content refers to sub-applications by a urlconf identifier
//! such as `"articles.urls"`. [`UrlconfRegistry`] maps those identifiers to
//! resolvers and implements [`Router`], the reversing interface the
//! application-aware resolver delegates to.

use std::collections::HashMap;
use std::fmt;

use articles_rs_core::{ArticlesError, ArticlesResult};

use super::resolver::{ResolverMatch, URLResolver};
use super::reverse::{reverse, ReverseOptions};

/// Builds URLs for named views inside a named URL configuration.
pub trait Router: Send + Sync {
    /// Reverses `view_name` within `urlconf`, placing the result under
    /// `options.prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::NoReverseMatch`] when the name/arguments
    /// combination cannot be routed.
    fn reverse(
        &self,
        view_name: &str,
        urlconf: &str,
        args: &[String],
        kwargs: &HashMap<String, String>,
        options: &ReverseOptions<'_>,
    ) -> ArticlesResult<String>;
}

/// A registry of URL configurations keyed by identifier.
#[derive(Default)]
pub struct UrlconfRegistry {
    confs: HashMap<String, URLResolver>,
}

impl fmt::Debug for UrlconfRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.confs.keys().collect();
        names.sort();
        f.debug_struct("UrlconfRegistry").field("confs", &names).finish()
    }
}

impl UrlconfRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the resolver for `urlconf`.
    pub fn register(&mut self, urlconf: impl Into<String>, resolver: URLResolver) {
        self.confs.insert(urlconf.into(), resolver);
    }

    /// Returns the resolver registered for `urlconf`.
    pub fn get(&self, urlconf: &str) -> Option<&URLResolver> {
        self.confs.get(urlconf)
    }

    /// Returns `true` if `urlconf` is registered.
    pub fn contains(&self, urlconf: &str) -> bool {
        self.confs.contains_key(urlconf)
    }

    /// Resolves `path` (without leading slash) inside `urlconf`.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::ImproperlyConfigured`] for an unregistered
    /// urlconf and [`ArticlesError::DoesNotExist`] when nothing matches.
    pub fn resolve(&self, urlconf: &str, path: &str) -> ArticlesResult<ResolverMatch> {
        self.get(urlconf)
            .ok_or_else(|| not_registered(urlconf))?
            .resolve(path)
    }

    /// Returns the registered identifiers, sorted.
    pub fn urlconfs(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.confs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Router for UrlconfRegistry {
    fn reverse(
        &self,
        view_name: &str,
        urlconf: &str,
        args: &[String],
        kwargs: &HashMap<String, String>,
        options: &ReverseOptions<'_>,
    ) -> ArticlesResult<String> {
        let resolver = self.get(urlconf).ok_or_else(|| not_registered(urlconf))?;
        let url = reverse(view_name, args, kwargs, resolver, options)?;
        tracing::trace!(view = view_name, urlconf, url = %url, "reversed");
        Ok(url)
    }
}

fn not_registered(urlconf: &str) -> ArticlesError {
    ArticlesError::ImproperlyConfigured(format!("Urlconf '{urlconf}' is not registered"))
}
