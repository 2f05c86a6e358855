//! Settings for the articles add-on.
//!
//! [`Settings`] holds everything the add-on reads at runtime. It is passed
//! explicitly to the components that need it; there is no process-wide
//! settings singleton.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Cache backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// The cache backend: `"locmem"` or `"dummy"`.
    pub backend: String,
    /// Default entry lifetime in seconds. `None` keeps entries until the
    /// process exits.
    pub timeout: Option<u64>,
    /// Prefix prepended to every key written by the add-on.
    pub key_prefix: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: "locmem".to_string(),
            timeout: None,
            key_prefix: String::new(),
        }
    }
}

/// An application that can be mounted on a page through application content.
///
/// The `urls` field overrides the urlconf actually used for reversing, which
/// allows one application to be mounted under a rewritten URL configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSettings {
    /// The urlconf identifier stored on application content bindings.
    pub urlconf: String,
    /// Human-readable name shown in the admin.
    pub name: String,
    /// Alternate urlconf used when reversing, if any.
    #[serde(default)]
    pub urls: Option<String>,
}

impl ApplicationSettings {
    /// Creates an application entry without an override.
    pub fn new(urlconf: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            urlconf: urlconf.into(),
            name: name.into(),
            urls: None,
        }
    }

    /// Sets the alternate urlconf.
    #[must_use]
    pub fn urls(mut self, urls: impl Into<String>) -> Self {
        self.urls = Some(urls.into());
        self
    }
}

/// Settings specific to articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSettings {
    /// Skip the cache read in application reversal and always recompute the
    /// prefix. The computed prefix is still written to the cache.
    pub bypass_reverse_cache: bool,
    /// Admin class used as the base for the article admin.
    pub model_admin_class: String,
    /// Enabled model extensions, by name (e.g. `"author"`).
    pub extensions: Vec<String>,
    /// Applications that may be mounted through application content.
    pub applications: Vec<ApplicationSettings>,
    /// Template used by the article list tags.
    pub list_template: String,
    /// Template used by the category list tag.
    pub categories_template: String,
}

impl Default for ArticleSettings {
    fn default() -> Self {
        Self {
            bypass_reverse_cache: true,
            model_admin_class: "feincms.extensions.ExtensionModelAdmin".to_string(),
            extensions: Vec::new(),
            applications: vec![
                ApplicationSettings::new("articles.urls", "Articles"),
                ApplicationSettings::new("articles.category.urls", "Article categories"),
            ],
            list_template: "articles/articles.html".to_string(),
            categories_template: "articles/categories.html".to_string(),
        }
    }
}

impl ArticleSettings {
    /// Returns the application entry registered for `urlconf`, if any.
    pub fn application(&self, urlconf: &str) -> Option<&ApplicationSettings> {
        self.applications.iter().find(|app| app.urlconf == urlconf)
    }
}

/// The complete set of add-on settings.
///
/// # Examples
///
/// ```
/// use articles_rs_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.site_id, 1);
/// assert!(settings.articles.bypass_reverse_cache);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The log filter (e.g. "info", "articles_rs_app=debug").
    pub log_level: String,
    /// The default language code (e.g. "en-us").
    pub language_code: String,
    /// The current site; part of every reverse cache key.
    pub site_id: u64,
    /// Cache configuration.
    pub cache: CacheSettings,
    /// Article-specific configuration.
    pub articles: ArticleSettings,
    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            language_code: "en-us".to_string(),
            site_id: 1,
            cache: CacheSettings::default(),
            articles: ArticleSettings::default(),
            extra: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.language_code, "en-us");
        assert_eq!(s.site_id, 1);
        assert_eq!(s.cache.backend, "locmem");
        assert!(s.cache.timeout.is_none());
    }

    #[test]
    fn test_default_article_settings() {
        let a = ArticleSettings::default();
        assert!(a.bypass_reverse_cache);
        assert!(a.extensions.is_empty());
        assert_eq!(a.list_template, "articles/articles.html");
        assert_eq!(a.categories_template, "articles/categories.html");
        assert!(a.model_admin_class.ends_with("ExtensionModelAdmin"));
    }

    #[test]
    fn test_application_lookup() {
        let mut a = ArticleSettings::default();
        a.applications
            .push(ApplicationSettings::new("news.urls", "News").urls("articles.urls"));

        let news = a.application("news.urls").expect("news registered");
        assert_eq!(news.urls.as_deref(), Some("articles.urls"));
        assert!(a.application("articles.urls").is_some_and(|app| app.urls.is_none()));
        assert!(a.application("missing.urls").is_none());
    }

    #[test]
    fn test_settings_serde_roundtrip_keeps_applications() {
        let s = Settings::default();
        let json = serde_json::to_value(&s).unwrap();
        let back: Settings = serde_json::from_value(json).unwrap();
        assert_eq!(back.articles, s.articles);
    }
}
