//! Articles.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use articles_rs_core::{ArticlesError, ArticlesResult};

use crate::reverse::{CanonicalUrl, UrlSpec};

/// Maximum length of `title` and `slug`.
pub const MAX_LENGTH: usize = 255;

/// Fields that are reset when an article is copied.
pub const EXCLUDE_FROM_COPY: &[&str] = &["id", "tree_id", "lft", "rght", "level", "redirect_to"];

fn default_true() -> bool {
    true
}

/// An article. Articles form a tree through `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Primary key; `0` for an article that was never saved.
    #[serde(default)]
    pub id: u64,
    /// Title, at most [`MAX_LENGTH`] characters.
    pub title: String,
    /// Unique slug.
    pub slug: String,
    /// Whether the article is published.
    #[serde(default = "default_true")]
    pub active: bool,
    /// Parent article.
    #[serde(default)]
    pub parent_id: Option<u64>,
    /// Category the article is filed under.
    #[serde(default)]
    pub category_id: Option<u64>,
    /// Content language.
    #[serde(default)]
    pub language: String,
    /// Author name; only editable when the author extension is registered.
    #[serde(default)]
    pub author: Option<String>,
    /// Publication timestamp.
    #[serde(default)]
    pub publication_date: Option<DateTime<Utc>>,
}

impl Article {
    /// Creates an unsaved, active article.
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            slug: slug.into(),
            active: true,
            parent_id: None,
            category_id: None,
            language: String::new(),
            author: None,
            publication_date: None,
        }
    }

    /// Sets the primary key.
    #[must_use]
    pub const fn id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Sets the category.
    #[must_use]
    pub const fn category(mut self, category_id: u64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Sets the parent article.
    #[must_use]
    pub const fn parent(mut self, parent_id: u64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets the language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the published flag.
    #[must_use]
    pub const fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Sets the publication date.
    #[must_use]
    pub const fn published(mut self, date: DateTime<Utc>) -> Self {
        self.publication_date = Some(date);
        self
    }
}

impl fmt::Display for Article {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl CanonicalUrl for Article {
    fn url_spec(&self) -> UrlSpec {
        UrlSpec::new("article_detail", "articles.urls").kwarg("slug", &self.slug)
    }
}

/// Sorts articles by an ordering expression such as `"title"` or
/// `"-publication_date"`. Ties keep their previous order.
///
/// # Errors
///
/// Returns [`ArticlesError::ConfigurationError`] for unknown fields.
pub fn order_articles(articles: &mut [Article], order_by: &str) -> ArticlesResult<()> {
    let (descending, field) = order_by
        .strip_prefix('-')
        .map_or((false, order_by), |rest| (true, rest));

    let compare: fn(&Article, &Article) -> Ordering = match field {
        "title" => |a, b| a.title.cmp(&b.title),
        "slug" => |a, b| a.slug.cmp(&b.slug),
        "id" | "pk" => |a, b| a.id.cmp(&b.id),
        "publication_date" => |a, b| a.publication_date.cmp(&b.publication_date),
        "language" => |a, b| a.language.cmp(&b.language),
        _ => {
            return Err(ArticlesError::ConfigurationError(format!(
                "Cannot order articles by '{order_by}'"
            )))
        }
    };

    if descending {
        articles.sort_by(|a, b| compare(b, a));
    } else {
        articles.sort_by(compare);
    }
    Ok(())
}

/// In-memory article store.
#[derive(Debug, Default)]
pub struct ArticleStore {
    articles: RwLock<BTreeMap<u64, Article>>,
}

impl ArticleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<u64, Article>> {
        self.articles.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or replaces an article and returns its id. An id of `0`
    /// assigns the next free id.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::IntegrityError`] when the slug is taken by
    /// another article, the parent is missing, or the parent chain loops.
    pub fn save(&self, mut article: Article) -> ArticlesResult<u64> {
        let mut articles = self.articles.write().unwrap_or_else(PoisonError::into_inner);
        if article.id == 0 {
            article.id = articles.keys().next_back().map_or(1, |last| last + 1);
        }

        if let Some(other) = articles
            .values()
            .find(|a| a.slug == article.slug && a.id != article.id)
        {
            return Err(ArticlesError::IntegrityError(format!(
                "Article slug '{}' is already used by article {}",
                article.slug, other.id
            )));
        }

        let mut cursor = article.parent_id;
        while let Some(parent_id) = cursor {
            if parent_id == article.id {
                return Err(ArticlesError::IntegrityError(format!(
                    "Article {} cannot be its own ancestor",
                    article.id
                )));
            }
            cursor = articles
                .get(&parent_id)
                .ok_or_else(|| {
                    ArticlesError::IntegrityError(format!(
                        "Article {} references missing parent {parent_id}",
                        article.id
                    ))
                })?
                .parent_id;
        }

        let id = article.id;
        tracing::debug!(article = id, slug = %article.slug, "article saved");
        articles.insert(id, article);
        Ok(id)
    }

    /// Deletes an article; returns `true` if it existed.
    pub fn delete(&self, id: u64) -> bool {
        self.articles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Returns the article with the given id.
    pub fn get(&self, id: u64) -> Option<Article> {
        self.read().get(&id).cloned()
    }

    /// Returns every article ordered by title.
    pub fn all(&self) -> Vec<Article> {
        let mut all: Vec<Article> = self.read().values().cloned().collect();
        all.sort_by(|a, b| a.title.cmp(&b.title));
        all
    }

    /// Returns active articles ordered by title.
    pub fn active(&self) -> Vec<Article> {
        let mut active: Vec<Article> = self.read().values().filter(|a| a.active).cloned().collect();
        active.sort_by(|a, b| a.title.cmp(&b.title));
        active
    }

    /// Returns `true` if the article exists and is part of [`active`](Self::active).
    pub fn is_active(&self, id: u64) -> bool {
        self.read().get(&id).is_some_and(|a| a.active)
    }

    /// Looks up an article by its exact slug.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::DoesNotExist`] if no article has the slug.
    pub fn get_by_slug(&self, slug: &str) -> ArticlesResult<Article> {
        self.read()
            .values()
            .find(|a| a.slug == slug)
            .cloned()
            .ok_or_else(|| ArticlesError::DoesNotExist(format!("Article with slug '{slug}'")))
    }

    /// Returns the active articles of a category in the given order.
    ///
    /// # Errors
    ///
    /// Fails when `order_by` names an unknown field.
    pub fn by_category(&self, category_id: u64, order_by: &str) -> ArticlesResult<Vec<Article>> {
        let mut articles: Vec<Article> = self
            .active()
            .into_iter()
            .filter(|a| a.category_id == Some(category_id))
            .collect();
        order_articles(&mut articles, order_by)?;
        Ok(articles)
    }

    /// Returns the direct children of an article ordered by title.
    pub fn children(&self, id: u64) -> Vec<Article> {
        self.all()
            .into_iter()
            .filter(|a| a.parent_id == Some(id))
            .collect()
    }

    /// Returns an unsaved copy of an article.
    ///
    /// The fields in [`EXCLUDE_FROM_COPY`] are reset; the slug must be
    /// changed before the copy can be saved.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::DoesNotExist`] for unknown ids.
    pub fn copy_of(&self, id: u64) -> ArticlesResult<Article> {
        let mut copy = self
            .get(id)
            .ok_or_else(|| ArticlesError::DoesNotExist(format!("Article {id}")))?;
        copy.id = 0;
        Ok(copy)
    }

    /// Counts articles per category id.
    pub fn count_by_category(&self) -> HashMap<u64, usize> {
        let mut counts = HashMap::new();
        for category in self.read().values().filter_map(|a| a.category_id) {
            *counts.entry(category).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store() -> ArticleStore {
        let store = ArticleStore::new();
        store.save(Article::new("Zebra", "zebra").category(1)).unwrap();
        store.save(Article::new("Apple", "apple").category(1)).unwrap();
        store.save(Article::new("Mango", "mango").active(false).category(1)).unwrap();
        store
    }

    #[test]
    fn test_save_assigns_ids() {
        let store = store();
        assert_eq!(store.get_by_slug("zebra").unwrap().id, 1);
        assert_eq!(store.get_by_slug("apple").unwrap().id, 2);
    }

    #[test]
    fn test_active_ordered_by_title() {
        let store = store();
        let titles: Vec<String> = store.active().into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["Apple", "Zebra"]);
        assert!(store.is_active(1));
        assert!(!store.is_active(3));
        assert!(!store.is_active(42));
    }

    #[test]
    fn test_unique_slug() {
        let store = store();
        let err = store.save(Article::new("Other", "apple")).unwrap_err();
        assert!(matches!(err, ArticlesError::IntegrityError(_)));
        // Saving the same article again is fine.
        store.save(Article::new("Apple 2", "apple").id(2)).unwrap();
    }

    #[test]
    fn test_parent_integrity() {
        let store = store();
        store.save(Article::new("Child", "child").parent(1)).unwrap();
        assert_eq!(store.children(1).len(), 1);
        assert!(store.save(Article::new("Lost", "lost").parent(99)).is_err());
        assert!(store.save(Article::new("Zebra", "zebra").id(1).parent(4)).is_err());
    }

    #[test]
    fn test_by_category_ordering() {
        let store = ArticleStore::new();
        let early = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        store.save(Article::new("A", "a").category(5).published(early)).unwrap();
        store.save(Article::new("B", "b").category(5).published(late)).unwrap();
        store.save(Article::new("C", "c").category(6)).unwrap();

        let newest: Vec<String> = store
            .by_category(5, "-publication_date")
            .unwrap()
            .into_iter()
            .map(|a| a.slug)
            .collect();
        assert_eq!(newest, vec!["b", "a"]);
        assert!(store.by_category(5, "colour").is_err());
    }

    #[test]
    fn test_copy_of_resets_id() {
        let store = store();
        let copy = store.copy_of(2).unwrap();
        assert_eq!(copy.id, 0);
        assert_eq!(copy.title, "Apple");
        assert!(EXCLUDE_FROM_COPY.contains(&"id"));
        assert!(store.copy_of(99).is_err());
    }

    #[test]
    fn test_canonical_url_spec() {
        let spec = Article::new("Hello", "hello").url_spec();
        assert_eq!(spec.view_name, "article_detail");
        assert_eq!(spec.urlconf, "articles.urls");
        assert!(spec.args.is_empty());
        assert_eq!(spec.kwargs.get("slug").map(String::as_str), Some("hello"));
    }
}
