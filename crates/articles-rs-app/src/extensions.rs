//! Model extensions.
//!
//! An extension adds fields to the article model and matching options to
//! the article admin. Extensions are enabled by name through
//! `articles.extensions` in the settings.

use std::fmt;

use articles_rs_core::settings::ArticleSettings;
use articles_rs_core::{ArticlesError, ArticlesResult};

use crate::admin::{ArticleAdmin, Fieldset};
use crate::models::article::MAX_LENGTH;

/// A model field as seen by forms and the admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Attribute name.
    pub name: String,
    /// Human-readable label.
    pub verbose_name: String,
    /// Whether the form may leave the field empty.
    pub blank: bool,
    /// Maximum length for text fields.
    pub max_length: Option<usize>,
}

impl FieldDef {
    /// A required field without a length limit.
    pub fn new(name: impl Into<String>, verbose_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verbose_name: verbose_name.into(),
            blank: false,
            max_length: None,
        }
    }

    /// Allows the field to be left empty.
    #[must_use]
    pub const fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    /// Limits the length of the field.
    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

/// The editable fields of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMeta {
    /// Model name.
    pub model_name: String,
    fields: Vec<FieldDef>,
}

impl ModelMeta {
    /// The article model before any extension runs.
    pub fn article() -> Self {
        Self {
            model_name: "article".to_string(),
            fields: vec![
                FieldDef::new("title", "title").max_length(MAX_LENGTH),
                FieldDef::new("slug", "slug").max_length(MAX_LENGTH),
                FieldDef::new("active", "active").blank(),
                FieldDef::new("parent", "Parent").blank(),
                FieldDef::new("category", "category").blank(),
                FieldDef::new("language", "language").blank(),
                FieldDef::new("publication_date", "publication date").blank(),
            ],
        }
    }

    /// Adds a field. A field with the same name is replaced.
    pub fn add_field(&mut self, field: FieldDef) {
        self.remove_field(&field.name);
        self.fields.push(field);
    }

    /// Removes a field; returns `true` if it existed.
    pub fn remove_field(&mut self, name: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.name != name);
        self.fields.len() != before
    }

    /// Looks up a field.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns `true` if the model has the field.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }
}

/// Adds fields to the model and options to its admin.
pub trait Extension: Send + Sync {
    /// The name used in settings.
    fn name(&self) -> &str;

    /// Adds fields to the model.
    fn handle_model(&self, model: &mut ModelMeta);

    /// Adds options to the admin. Does nothing by default.
    fn handle_modeladmin(&self, _admin: &mut ArticleAdmin) {}
}

/// Stores the article author as free text.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorExtension;

impl Extension for AuthorExtension {
    fn name(&self) -> &str {
        "author"
    }

    fn handle_model(&self, model: &mut ModelMeta) {
        model.add_field(FieldDef::new("author", "author").blank().max_length(MAX_LENGTH));
    }

    fn handle_modeladmin(&self, admin: &mut ArticleAdmin) {
        admin.add_extension_options(
            Fieldset::new(vec!["author"])
                .name("Author")
                .classes(vec!["collapse"]),
        );
    }
}

/// Resolves an extension by its settings name. Both the short name and the
/// dotted module path are accepted.
///
/// # Errors
///
/// Returns [`ArticlesError::ImproperlyConfigured`] for unknown names.
pub fn extension_by_name(name: &str) -> ArticlesResult<Box<dyn Extension>> {
    match name {
        "author" | "articles.extensions.author" => Ok(Box::new(AuthorExtension)),
        other => Err(ArticlesError::ImproperlyConfigured(format!(
            "Unknown article extension '{other}'"
        ))),
    }
}

/// The enabled extensions and the model they produce.
pub struct ExtensionRegistry {
    extensions: Vec<Box<dyn Extension>>,
    model: ModelMeta,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.names())
            .field("model", &self.model)
            .finish()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionRegistry {
    /// A registry without extensions.
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
            model: ModelMeta::article(),
        }
    }

    /// Registers every extension named in `settings`.
    ///
    /// # Errors
    ///
    /// Fails on the first unknown extension name.
    pub fn from_settings(settings: &ArticleSettings) -> ArticlesResult<Self> {
        let mut registry = Self::new();
        for name in &settings.extensions {
            registry.register(extension_by_name(name)?);
        }
        Ok(registry)
    }

    /// Registers an extension and applies it to the model. Registering the
    /// same name twice has no effect.
    pub fn register(&mut self, extension: Box<dyn Extension>) {
        if self.extensions.iter().any(|e| e.name() == extension.name()) {
            return;
        }
        extension.handle_model(&mut self.model);
        tracing::debug!(extension = extension.name(), "article extension registered");
        self.extensions.push(extension);
    }

    /// Lets every extension adjust `admin`, in registration order.
    pub fn apply_to_admin(&self, admin: &mut ArticleAdmin) {
        for extension in &self.extensions {
            extension.handle_modeladmin(admin);
        }
    }

    /// The extended model.
    pub fn model(&self) -> &ModelMeta {
        &self.model
    }

    /// Names of the registered extensions.
    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_model_has_no_author() {
        let model = ModelMeta::article();
        assert!(model.has_field("title"));
        assert!(!model.has_field("author"));
        assert_eq!(model.field("slug").unwrap().max_length, Some(MAX_LENGTH));
    }

    #[test]
    fn test_author_extension_adds_field() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Box::new(AuthorExtension));
        let author = registry.model().field("author").unwrap();
        assert!(author.blank);
        assert_eq!(author.verbose_name, "author");
    }

    #[test]
    fn test_register_twice() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Box::new(AuthorExtension));
        registry.register(Box::new(AuthorExtension));
        assert_eq!(registry.names(), vec!["author"]);
        assert_eq!(
            registry.model().fields().iter().filter(|f| f.name == "author").count(),
            1
        );
    }

    #[test]
    fn test_from_settings() {
        let settings = ArticleSettings {
            extensions: vec!["articles.extensions.author".to_string()],
            ..ArticleSettings::default()
        };
        let registry = ExtensionRegistry::from_settings(&settings).unwrap();
        assert!(registry.model().has_field("author"));

        let settings = ArticleSettings {
            extensions: vec!["tags".to_string()],
            ..ArticleSettings::default()
        };
        assert!(matches!(
            ExtensionRegistry::from_settings(&settings),
            Err(ArticlesError::ImproperlyConfigured(_))
        ));
    }

    #[test]
    fn test_remove_field() {
        let mut model = ModelMeta::article();
        assert!(model.remove_field("language"));
        assert!(!model.remove_field("language"));
    }
}
