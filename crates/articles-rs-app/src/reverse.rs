//! Application-aware URL reversal.
//!
//! Sub-applications are mounted on pages through application content, so a
//! view inside `articles.urls` has no fixed URL: it lives under whichever
//! page carries the binding. [`AppReverser`] finds that page, caches the
//! `(urlconf, prefix)` pair per language, site and cache generation, and
//! hands the actual reversal to the [`Router`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use articles_rs_app::models::{ApplicationContentBinding, ContentBindingStore, Page, PageTree};
//! use articles_rs_app::reverse::{AppReverser, ReverseArgs, UrlconfSource};
//! use articles_rs_app::urls::default_urlconfs;
//! use articles_rs_cache::{CacheGeneration, InMemoryCache};
//! use articles_rs_core::Settings;
//!
//! let pages = Arc::new(PageTree::new());
//! pages.save(Page::new(1, "News", "news")).unwrap();
//! let bindings = Arc::new(ContentBindingStore::new(Arc::clone(&pages)));
//! bindings.save(ApplicationContentBinding::new(1, 1, "articles.urls")).unwrap();
//!
//! let cache = Arc::new(InMemoryCache::new());
//! let reverser = AppReverser::new(
//!     &Settings::default(),
//!     cache.clone(),
//!     Arc::new(CacheGeneration::new(cache)),
//!     Arc::new(default_urlconfs().unwrap()),
//!     bindings,
//! );
//!
//! let url = reverser
//!     .reverse(
//!         "article_detail",
//!         UrlconfSource::Path("articles.urls"),
//!         ReverseArgs::new().kwarg("slug", "hello"),
//!     )
//!     .unwrap();
//! assert_eq!(url, "/news/hello/");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use articles_rs_cache::{cycle_app_reverse_cache, CacheBackend, CacheValue, GenerationRegistry};
use articles_rs_core::logging::reverse_span;
use articles_rs_core::settings::ArticleSettings;
use articles_rs_core::utils::LazyText;
use articles_rs_core::{i18n, ArticlesError, ArticlesResult, Settings};
use articles_rs_urls::{ReverseOptions, Router};

use crate::models::ActiveBindingFinder;

/// Keyword argument that narrows the closest match to pages with this slug.
/// It is consumed and never reaches the router.
pub const PAGE_SLUG_KWARG: &str = "page_slug";

/// Where the urlconf identifier comes from.
#[derive(Debug, Clone, Copy)]
pub enum UrlconfSource<'a> {
    /// A urlconf identifier such as `"articles.urls"`.
    Path(&'a str),
    /// The extra context of a request rendered inside application content;
    /// the urlconf is read from its `app_config.urlconf_path` entry.
    Context(&'a serde_json::Value),
}

impl<'a> From<&'a str> for UrlconfSource<'a> {
    fn from(path: &'a str) -> Self {
        Self::Path(path)
    }
}

impl UrlconfSource<'_> {
    /// Returns the urlconf identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::NoReverseMatch`] for a context without an
    /// application config.
    pub fn urlconf(&self) -> ArticlesResult<String> {
        match self {
            Self::Path(path) => Ok((*path).to_string()),
            Self::Context(context) => context
                .pointer("/app_config/urlconf_path")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    ArticlesError::NoReverseMatch(
                        "Context carries no app_config.urlconf_path".to_string(),
                    )
                }),
        }
    }
}

/// Positional and keyword arguments for a reversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseArgs {
    /// Positional arguments.
    pub args: Vec<String>,
    /// Keyword arguments, possibly including [`PAGE_SLUG_KWARG`].
    pub kwargs: HashMap<String, String>,
    /// Instance namespace hint passed through to the router.
    pub current_app: Option<String>,
}

impl ReverseArgs {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Sets a keyword argument.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Narrows the closest match to pages with this slug. An empty slug
    /// does not narrow.
    #[must_use]
    pub fn page_slug(self, slug: impl Into<String>) -> Self {
        self.kwarg(PAGE_SLUG_KWARG, slug)
    }

    /// Sets the current application hint.
    #[must_use]
    pub fn current_app(mut self, current_app: impl Into<String>) -> Self {
        self.current_app = Some(current_app.into());
        self
    }
}

/// What an entity needs to name its canonical URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSpec {
    /// View name inside the urlconf.
    pub view_name: String,
    /// Urlconf identifier the entity's views live in.
    pub urlconf: String,
    /// Positional arguments.
    pub args: Vec<String>,
    /// Keyword arguments.
    pub kwargs: HashMap<String, String>,
}

impl UrlSpec {
    /// A spec without arguments.
    pub fn new(view_name: impl Into<String>, urlconf: impl Into<String>) -> Self {
        Self {
            view_name: view_name.into(),
            urlconf: urlconf.into(),
            args: Vec::new(),
            kwargs: HashMap::new(),
        }
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Sets a keyword argument.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }
}

/// Entities whose canonical URL lives inside a mounted application.
pub trait CanonicalUrl {
    /// Names the view and arguments of the entity's canonical URL.
    fn url_spec(&self) -> UrlSpec;
}

/// The cached outcome of a closest-match lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseCacheEntry {
    /// The urlconf to reverse in, after the application override.
    pub urlconf: String,
    /// URL of the page the application is mounted on, ending in `/`.
    pub prefix: String,
}

/// Builds the reverse cache key for a urlconf.
pub fn cache_key(urlconf: &str, language: &str, site_id: u64, generation: u64) -> String {
    format!("{urlconf}-{language}-{site_id}-{generation}")
}

/// Returns `url` ending in `/`, appending one only when it is missing.
pub fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Reverses URLs of views inside applications mounted on pages.
///
/// Cloning is cheap; all collaborators are shared.
#[derive(Clone)]
pub struct AppReverser {
    articles: Arc<ArticleSettings>,
    site_id: u64,
    cache: Arc<dyn CacheBackend>,
    generation: Arc<dyn GenerationRegistry>,
    router: Arc<dyn Router>,
    finder: Arc<dyn ActiveBindingFinder>,
}

impl std::fmt::Debug for AppReverser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppReverser")
            .field("site_id", &self.site_id)
            .field("bypass_reverse_cache", &self.articles.bypass_reverse_cache)
            .finish_non_exhaustive()
    }
}

impl AppReverser {
    /// Creates a reverser from settings and its collaborators.
    pub fn new(
        settings: &Settings,
        cache: Arc<dyn CacheBackend>,
        generation: Arc<dyn GenerationRegistry>,
        router: Arc<dyn Router>,
        finder: Arc<dyn ActiveBindingFinder>,
    ) -> Self {
        Self {
            articles: Arc::new(settings.articles.clone()),
            site_id: settings.site_id,
            cache,
            generation,
            router,
            finder,
        }
    }

    /// The generation registry reversal keys are stamped with.
    pub fn generation(&self) -> &Arc<dyn GenerationRegistry> {
        &self.generation
    }

    /// Reverses `view_name` inside the application identified by `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::NoReverseMatch`] when no active page mounts
    /// the urlconf. Router and cache failures propagate unchanged.
    pub fn reverse(
        &self,
        view_name: &str,
        source: UrlconfSource<'_>,
        args: ReverseArgs,
    ) -> ArticlesResult<String> {
        let ReverseArgs {
            args,
            mut kwargs,
            current_app,
        } = args;
        let page_slug = kwargs.remove(PAGE_SLUG_KWARG).filter(|slug| !slug.is_empty());

        let urlconf = source.urlconf()?;
        let _span = reverse_span(view_name, &urlconf).entered();

        let key = cache_key(
            &urlconf,
            &i18n::get_language(),
            self.site_id,
            self.current_generation()?,
        );

        let entry = match self.cached_entry(&key)? {
            Some(entry) => {
                tracing::debug!(key = %key, "reverse cache hit");
                entry
            }
            None => self.compute_entry(&key, &urlconf, page_slug.as_deref())?,
        };

        let options =
            ReverseOptions::with_prefix(&entry.prefix).current_app(current_app.as_deref());
        self.router
            .reverse(view_name, &entry.urlconf, &args, &kwargs, &options)
    }

    /// Like [`reverse`](Self::reverse), but deferred until the text is
    /// needed. Every read reverses again with the language and cache
    /// generation current at that moment.
    pub fn reverse_lazy(
        &self,
        view_name: impl Into<String>,
        urlconf: impl Into<String>,
        args: ReverseArgs,
    ) -> LazyText {
        let reverser = self.clone();
        let view_name = view_name.into();
        let urlconf = urlconf.into();
        LazyText::new(move || {
            reverser.reverse(&view_name, UrlconfSource::Path(&urlconf), args.clone())
        })
    }

    /// Locates the page `urlconf` is mounted on for the active language and
    /// applies the override table. Neither reads nor writes the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::NoReverseMatch`] when no active page mounts
    /// the urlconf.
    pub fn mount(
        &self,
        urlconf: &str,
        page_slug: Option<&str>,
    ) -> ArticlesResult<ReverseCacheEntry> {
        let found = self.finder.closest_match(urlconf, page_slug).ok_or_else(|| {
            ArticlesError::NoReverseMatch(format!(
                "Unable to find ApplicationContent for '{urlconf}'"
            ))
        })?;

        let resolved = self
            .articles
            .application(urlconf)
            .and_then(|app| app.urls.clone())
            .unwrap_or_else(|| urlconf.to_string());

        let entry = ReverseCacheEntry {
            urlconf: resolved,
            prefix: with_trailing_slash(&found.page_url),
        };
        tracing::debug!(
            binding = found.binding.id,
            page = found.page.id,
            urlconf = %entry.urlconf,
            prefix = %entry.prefix,
            "application content resolved"
        );
        Ok(entry)
    }

    /// Reverses the canonical URL of an entity.
    ///
    /// # Errors
    ///
    /// Same as [`reverse`](Self::reverse).
    pub fn canonical_url(&self, entity: &impl CanonicalUrl) -> ArticlesResult<String> {
        let spec = entity.url_spec();
        let args = ReverseArgs {
            args: spec.args,
            kwargs: spec.kwargs,
            current_app: None,
        };
        self.reverse(&spec.view_name, UrlconfSource::Path(&spec.urlconf), args)
    }

    fn current_generation(&self) -> ArticlesResult<u64> {
        if let Some(generation) = self.generation.current()? {
            return Ok(generation);
        }
        cycle_app_reverse_cache(self.generation.as_ref());
        if let Some(generation) = self.generation.current()? {
            return Ok(generation);
        }
        tracing::warn!("cache generation unavailable after cycling, using 0");
        Ok(0)
    }

    fn cached_entry(&self, key: &str) -> ArticlesResult<Option<ReverseCacheEntry>> {
        if self.articles.bypass_reverse_cache {
            return Ok(None);
        }
        match self.cache.get(key)? {
            Some(CacheValue::Json(value)) => match serde_json::from_value(value) {
                Ok(entry) => Ok(Some(entry)),
                Err(err) => {
                    tracing::warn!(key, error = %err, "discarding malformed reverse cache entry");
                    Ok(None)
                }
            },
            Some(_) | None => Ok(None),
        }
    }

    fn compute_entry(
        &self,
        key: &str,
        urlconf: &str,
        page_slug: Option<&str>,
    ) -> ArticlesResult<ReverseCacheEntry> {
        let entry = self.mount(urlconf, page_slug)?;
        self.cache
            .set(key, CacheValue::Json(serde_json::to_value(&entry)?), None)?;
        Ok(entry)
    }
}
