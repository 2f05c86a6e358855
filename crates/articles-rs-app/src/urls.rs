//! URL configurations shipped with the articles app.
//!
//! Both are mounted on pages through application content; their reversed
//! URLs therefore start with the page URL chosen by
//! [`AppReverser`](crate::reverse::AppReverser).

use articles_rs_core::ArticlesResult;
use articles_rs_urls::pattern::{path, re_path};
use articles_rs_urls::resolver::{root, URLEntry, URLResolver};
use articles_rs_urls::UrlconfRegistry;

/// Identifier of the article list/detail urlconf.
pub const ARTICLES_URLCONF: &str = "articles.urls";

/// Identifier of the category urlconf.
pub const CATEGORY_URLCONF: &str = "articles.category.urls";

/// `articles.urls`: the article index and article detail pages.
///
/// # Errors
///
/// Fails only if a pattern does not compile.
pub fn article_urlpatterns() -> ArticlesResult<URLResolver> {
    root(vec![
        URLEntry::Pattern(path("", Some("article_index"))?),
        URLEntry::Pattern(re_path(r"^(?P<slug>[a-z0-9_-]+)/$", Some("article_detail"))?),
    ])
}

/// `articles.category.urls`: the category index and one page per category.
///
/// # Errors
///
/// Fails only if a pattern does not compile.
pub fn category_urlpatterns() -> ArticlesResult<URLResolver> {
    root(vec![
        URLEntry::Pattern(path("", Some("article_category_index"))?),
        URLEntry::Pattern(path("<slug:category_url>/", Some("article_category"))?),
    ])
}

/// A registry holding both shipped urlconfs.
///
/// # Errors
///
/// Fails only if a pattern does not compile.
pub fn default_urlconfs() -> ArticlesResult<UrlconfRegistry> {
    let mut registry = UrlconfRegistry::new();
    registry.register(ARTICLES_URLCONF, article_urlpatterns()?);
    registry.register(CATEGORY_URLCONF, category_urlpatterns()?);
    Ok(registry)
}
