//! The article change form.
//!
//! [`ArticleAdminForm`] binds raw form data, validates it against the
//! extended article model and the existing articles, and produces an
//! [`Article`] ready to be saved.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use articles_rs_core::utils::text::{is_valid_slug, slugify};
use articles_rs_core::{ArticlesResult, ValidationError};

use crate::extensions::ModelMeta;
use crate::models::{Article, ArticleStore};

/// Fields never copied from the original when an article is translated.
pub const NEVER_COPY_FIELDS: &[&str] = &[
    "title",
    "slug",
    "parent",
    "active",
    "override_url",
    "translation_of",
    "_content_title",
    "_page_title",
];

const TRUE_VALUES: &[&str] = &["on", "true", "1", "yes"];

#[derive(Default)]
struct FieldErrors(HashMap<String, Vec<ValidationError>>);

impl FieldErrors {
    fn add(&mut self, field: &str, message: impl Into<String>, code: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(ValidationError::new(message, code));
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError::with_field_errors(self.0))
        }
    }
}

/// Change form for an article.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// use articles_rs_app::extensions::ModelMeta;
/// use articles_rs_app::forms::ArticleAdminForm;
/// use articles_rs_app::models::ArticleStore;
///
/// let store = Arc::new(ArticleStore::new());
/// let mut form = ArticleAdminForm::new(store, Arc::new(ModelMeta::article()));
/// form.bind(HashMap::from([("title".to_string(), "Hello World".to_string())]));
/// assert!(form.is_valid());
/// assert_eq!(form.cleaned_article().unwrap().slug, "hello-world");
/// ```
pub struct ArticleAdminForm {
    store: Arc<ArticleStore>,
    model: Arc<ModelMeta>,
    instance: Option<Article>,
    data: HashMap<String, String>,
    bound: bool,
    errors: HashMap<String, Vec<String>>,
    cleaned: Option<Article>,
}

impl std::fmt::Debug for ArticleAdminForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleAdminForm")
            .field("instance", &self.instance.as_ref().map(|a| a.id))
            .field("bound", &self.bound)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl ArticleAdminForm {
    /// A form for a new article.
    pub fn new(store: Arc<ArticleStore>, model: Arc<ModelMeta>) -> Self {
        Self {
            store,
            model,
            instance: None,
            data: HashMap::new(),
            bound: false,
            errors: HashMap::new(),
            cleaned: None,
        }
    }

    /// A form editing an existing article.
    #[must_use]
    pub fn with_instance(mut self, instance: Article) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Initial data for a translation of `original`: every model field
    /// except the [`NEVER_COPY_FIELDS`].
    pub fn initial_from(&self, original: &Article) -> HashMap<String, String> {
        let mut initial = HashMap::new();
        for field in self.model.fields() {
            if NEVER_COPY_FIELDS.contains(&field.name.as_str()) {
                continue;
            }
            let value = match field.name.as_str() {
                "category" => original.category_id.map(|id| id.to_string()),
                "language" => Some(original.language.clone()),
                "author" => original.author.clone(),
                "publication_date" => original.publication_date.map(|d| d.to_rfc3339()),
                _ => None,
            };
            if let Some(value) = value {
                initial.insert(field.name.clone(), value);
            }
        }
        initial
    }

    /// Binds raw form data, clearing earlier results.
    pub fn bind(&mut self, data: HashMap<String, String>) {
        self.data = data;
        self.bound = true;
        self.errors.clear();
        self.cleaned = None;
    }

    /// Returns `true` once data has been bound.
    pub const fn is_bound(&self) -> bool {
        self.bound
    }

    /// Validates the bound data. After this, [`errors`](Self::errors) and
    /// [`cleaned_article`](Self::cleaned_article) are populated.
    pub fn is_valid(&mut self) -> bool {
        if !self.bound {
            return false;
        }
        match self.clean() {
            Ok(article) => {
                self.errors.clear();
                self.cleaned = Some(article);
                true
            }
            Err(err) => {
                self.errors = err
                    .field_errors
                    .iter()
                    .map(|(field, errors)| {
                        (field.clone(), errors.iter().map(|e| e.message.clone()).collect())
                    })
                    .collect();
                self.cleaned = None;
                tracing::debug!(fields = ?self.errors.keys().collect::<Vec<_>>(), "article form invalid");
                false
            }
        }
    }

    /// Error messages per field.
    pub fn errors(&self) -> &HashMap<String, Vec<String>> {
        &self.errors
    }

    /// The validated article.
    pub fn cleaned_article(&self) -> Option<&Article> {
        self.cleaned.as_ref()
    }

    fn value(&self, field: &str) -> Option<&str> {
        self.data.get(field).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    /// Validates the bound data and builds the article.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] with one entry per invalid field.
    pub fn clean(&self) -> Result<Article, ValidationError> {
        let mut errors = FieldErrors::default();
        let instance_id = self.instance.as_ref().map_or(0, |a| a.id);

        let title = self.value("title").unwrap_or_default().to_string();
        if title.is_empty() {
            errors.add("title", "This field is required.", "required");
        }
        self.check_length("title", &title, &mut errors);

        let slug = self
            .value("slug")
            .map_or_else(|| slugify(&title), str::to_string);
        if slug.is_empty() {
            errors.add("slug", "This field is required.", "required");
        } else if !is_valid_slug(&slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
                "invalid",
            );
        } else if self
            .store
            .all()
            .iter()
            .any(|a| a.slug == slug && a.id != instance_id)
        {
            errors.add("slug", "Article with this slug already exists.", "unique");
        }
        self.check_length("slug", &slug, &mut errors);

        let parent_id = self.clean_parent(instance_id, &mut errors);
        let category_id = self.parse_id("category", &mut errors);

        let author = self.value("author").map(str::to_string);
        if author.is_some() && !self.model.has_field("author") {
            errors.add("author", "Unknown field.", "unknown_field");
        }
        if let Some(author) = &author {
            self.check_length("author", author, &mut errors);
        }

        let publication_date = match self.value("publication_date") {
            None => None,
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(date) => Some(date.with_timezone(&Utc)),
                Err(_) => {
                    errors.add("publication_date", "Enter a valid date/time.", "invalid");
                    None
                }
            },
        };

        let active = self
            .value("active")
            .is_some_and(|v| TRUE_VALUES.contains(&v.to_lowercase().as_str()));

        errors.into_result(Article {
            id: instance_id,
            title,
            slug,
            active,
            parent_id,
            category_id,
            language: self.value("language").unwrap_or_default().to_string(),
            author,
            publication_date,
        })
    }

    /// Validates and saves the article, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::ValidationError`] for invalid data; store
    /// errors propagate.
    ///
    /// [`ArticlesError::ValidationError`]: articles_rs_core::ArticlesError::ValidationError
    pub fn save(&mut self) -> ArticlesResult<u64> {
        let article = match self.cleaned.take() {
            Some(article) => article,
            None => self.clean()?,
        };
        let id = self.store.save(article.clone())?;
        self.cleaned = Some(Article { id, ..article });
        Ok(id)
    }

    fn check_length(&self, field: &str, value: &str, errors: &mut FieldErrors) {
        if let Some(max) = self.model.field(field).and_then(|f| f.max_length) {
            let length = value.chars().count();
            if length > max {
                errors.add(
                    field,
                    format!("Ensure this value has at most {max} characters (it has {length})."),
                    "max_length",
                );
            }
        }
    }

    fn parse_id(&self, field: &str, errors: &mut FieldErrors) -> Option<u64> {
        let raw = self.value(field)?;
        match raw.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add(field, format!("'{raw}' is not a valid id."), "invalid");
                None
            }
        }
    }

    fn clean_parent(&self, instance_id: u64, errors: &mut FieldErrors) -> Option<u64> {
        let parent_id = self.parse_id("parent", errors)?;
        if self.store.get(parent_id).is_none() {
            errors.add(
                "parent",
                "Select a valid choice. That choice is not one of the available choices.",
                "invalid_choice",
            );
            return None;
        }
        if instance_id != 0 {
            if parent_id == instance_id {
                errors.add("parent", "An article cannot be its own parent.", "invalid_parent");
            } else if self.is_descendant(parent_id, instance_id) {
                errors.add(
                    "parent",
                    "An article cannot be moved below one of its descendants.",
                    "invalid_parent",
                );
            }
        }
        Some(parent_id)
    }

    fn is_descendant(&self, candidate: u64, ancestor: u64) -> bool {
        let mut cursor = self.store.get(candidate).and_then(|a| a.parent_id);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.store.get(id).and_then(|a| a.parent_id);
        }
        false
    }
}
