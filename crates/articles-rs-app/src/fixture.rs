//! JSON fixtures.
//!
//! A fixture lists pages, application content bindings, categories and
//! articles:
//!
//! ```json
//! {
//!   "pages": [{"id": 1, "title": "News", "slug": "news", "language": "en"}],
//!   "bindings": [{"id": 1, "parent": 1, "urlconf_path": "articles.urls"}],
//!   "categories": [{"id": 1, "title": "Sport", "slug": "sport"}],
//!   "articles": [{"id": 1, "title": "Hello", "slug": "hello", "category_id": 1}]
//! }
//! ```
//!
//! Records may appear in any order; parents are saved before their children.

use std::path::Path;

use serde::{Deserialize, Serialize};

use articles_rs_core::{ArticlesError, ArticlesResult};

use crate::apps::ArticlesApp;
use crate::models::{ApplicationContentBinding, Article, Category, Page};

/// Counts of loaded records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Pages saved.
    pub pages: usize,
    /// Bindings saved.
    pub bindings: usize,
    /// Categories saved.
    pub categories: usize,
    /// Articles saved.
    pub articles: usize,
}

/// Content to load into an [`ArticlesApp`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// Pages.
    #[serde(default)]
    pub pages: Vec<Page>,
    /// Application content bindings.
    #[serde(default)]
    pub bindings: Vec<ApplicationContentBinding>,
    /// Articles.
    #[serde(default)]
    pub articles: Vec<Article>,
    /// Categories.
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Fixture {
    /// Parses a fixture from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::SerializationError`] for malformed JSON.
    pub fn from_json_str(json: &str) -> ArticlesResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ArticlesError::SerializationError(format!("Invalid fixture: {e}")))
    }

    /// Reads and parses a fixture file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> ArticlesResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "fixture read");
        Self::from_json_str(&content)
    }

    /// Saves every record into the app's stores.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::IntegrityError`] for records whose parent
    /// never appears, and propagates store errors.
    pub fn load_into(&self, app: &ArticlesApp) -> ArticlesResult<LoadSummary> {
        let mut summary = LoadSummary::default();

        summary.pages = save_parents_first(
            "page",
            self.pages.clone(),
            |p| p.id,
            |p| p.parent_id,
            |p| app.pages().save(p),
        )?;
        for binding in &self.bindings {
            app.bindings().save(binding.clone())?;
            summary.bindings += 1;
        }
        summary.categories = save_parents_first(
            "category",
            self.categories.clone(),
            |c| c.id,
            |c| c.parent_id,
            |c| app.categories().save(c),
        )?;
        summary.articles = save_parents_first(
            "article",
            self.articles.clone(),
            |a| a.id,
            |a| a.parent_id,
            |a| app.articles().save(a).map(|_| ()),
        )?;

        tracing::info!(
            pages = summary.pages,
            bindings = summary.bindings,
            categories = summary.categories,
            articles = summary.articles,
            "fixture loaded"
        );
        Ok(summary)
    }
}

/// Saves records in passes, each pass saving those whose parent is already
/// saved (or absent from the fixture and therefore expected to exist).
fn save_parents_first<T>(
    kind: &str,
    mut pending: Vec<T>,
    id: impl Fn(&T) -> u64,
    parent: impl Fn(&T) -> Option<u64>,
    mut save: impl FnMut(T) -> ArticlesResult<()>,
) -> ArticlesResult<usize> {
    let mut saved = 0;
    while !pending.is_empty() {
        let waiting: Vec<u64> = pending.iter().map(&id).collect();
        let (ready, blocked): (Vec<T>, Vec<T>) = pending
            .into_iter()
            .partition(|record| parent(record).map_or(true, |p| p == id(record) || !waiting.contains(&p)));
        if ready.is_empty() {
            let ids: Vec<String> = blocked.iter().map(|r| id(r).to_string()).collect();
            return Err(ArticlesError::IntegrityError(format!(
                "Circular {kind} parents: {}",
                ids.join(", ")
            )));
        }
        for record in ready {
            save(record)?;
            saved += 1;
        }
        pending = blocked;
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use articles_rs_core::Settings;

    const FIXTURE: &str = r#"{
        "pages": [
            {"id": 2, "parent_id": 1, "title": "Sport", "slug": "sport"},
            {"id": 1, "title": "News", "slug": "news", "language": "en"}
        ],
        "bindings": [{"id": 1, "parent": 2, "urlconf_path": "articles.urls"}],
        "categories": [
            {"id": 2, "parent_id": 1, "title": "Football", "slug": "football"},
            {"id": 1, "title": "Sport", "slug": "sport"}
        ],
        "articles": [
            {"id": 2, "parent_id": 1, "title": "Follow-up", "slug": "follow-up"},
            {"id": 1, "title": "Hello", "slug": "hello", "category_id": 2}
        ]
    }"#;

    #[test]
    fn test_load_out_of_order() {
        let app = ArticlesApp::new(Settings::default()).unwrap();
        let fixture = Fixture::from_json_str(FIXTURE).unwrap();
        let summary = fixture.load_into(&app).unwrap();
        assert_eq!(
            summary,
            LoadSummary {
                pages: 2,
                bindings: 1,
                categories: 2,
                articles: 2
            }
        );
        assert_eq!(app.pages().absolute_url(2).as_deref(), Some("/news/sport/"));
        assert_eq!(app.articles().children(1).len(), 1);
        assert!(app.categories().get(2).unwrap().active);
    }

    #[test]
    fn test_empty_sections_default() {
        let fixture = Fixture::from_json_str("{}").unwrap();
        assert_eq!(fixture, Fixture::default());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Fixture::from_json_str("{\"pages\": 3}"),
            Err(ArticlesError::SerializationError(_))
        ));
    }

    #[test]
    fn test_parent_cycle() {
        let app = ArticlesApp::new(Settings::default()).unwrap();
        let fixture = Fixture::from_json_str(
            r#"{"pages": [
                {"id": 1, "parent_id": 2, "title": "A", "slug": "a"},
                {"id": 2, "parent_id": 1, "title": "B", "slug": "b"}
            ]}"#,
        )
        .unwrap();
        let err = fixture.load_into(&app).unwrap_err();
        assert!(err.to_string().contains("Circular page parents: 1, 2"));
    }

    #[test]
    fn test_binding_to_missing_page() {
        let app = ArticlesApp::new(Settings::default()).unwrap();
        let fixture = Fixture::from_json_str(
            r#"{"bindings": [{"id": 1, "parent": 9, "urlconf_path": "articles.urls"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            fixture.load_into(&app),
            Err(ArticlesError::IntegrityError(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        std::fs::write(&path, FIXTURE).unwrap();
        let fixture = Fixture::from_json_file(&path).unwrap();
        assert_eq!(fixture.pages.len(), 2);
    }
}
