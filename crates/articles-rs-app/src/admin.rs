//! Admin configuration for articles.
//!
//! [`ArticleAdmin`] describes how articles are listed, searched and edited.
//! Extensions add their fieldsets at [`ArticleAdmin::fieldset_insertion_index`],
//! between the built-in fieldsets and the content fieldset.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use articles_rs_core::settings::ArticleSettings;

use crate::extensions::ExtensionRegistry;
use crate::models::Article;

/// Name of the fieldset holding the page content editor.
pub const CONTENT_FIELDSET_NAME: &str = "content";

/// A group of fields in the change form. Each line holds the fields shown
/// side by side.
///
/// ```
/// use articles_rs_app::admin::Fieldset;
///
/// let fieldset = Fieldset::lines(vec![vec!["title", "slug"], vec!["active"]]);
/// assert_eq!(fieldset.field_names(), vec!["title", "slug", "active"]);
/// assert!(fieldset.name.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fieldset {
    /// Optional display name.
    pub name: Option<String>,
    /// Field lines.
    pub lines: Vec<Vec<String>>,
    /// CSS classes such as `"collapse"`.
    pub classes: Vec<String>,
    /// Optional description shown below the name.
    pub description: Option<String>,
}

impl Fieldset {
    /// A fieldset with one field per line and no name.
    pub fn new(fields: Vec<&str>) -> Self {
        Self::lines(fields.into_iter().map(|f| vec![f]).collect())
    }

    /// A fieldset with explicit lines and no name.
    pub fn lines(lines: Vec<Vec<&str>>) -> Self {
        Self {
            name: None,
            lines: lines
                .into_iter()
                .map(|line| line.into_iter().map(String::from).collect())
                .collect(),
            classes: Vec::new(),
            description: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Sets the CSS classes.
    #[must_use]
    pub fn classes(mut self, classes: Vec<&str>) -> Self {
        self.classes = classes.into_iter().map(String::from).collect();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Every field in the fieldset, line by line.
    pub fn field_names(&self) -> Vec<&str> {
        self.lines.iter().flatten().map(String::as_str).collect()
    }

    /// Returns `true` if the fieldset starts collapsed.
    pub fn is_collapsed(&self) -> bool {
        self.classes.iter().any(|c| c == "collapse")
    }
}

/// Admin configuration for the article model.
///
/// # Examples
///
/// ```
/// use articles_rs_app::admin::ArticleAdmin;
/// use articles_rs_core::settings::ArticleSettings;
///
/// let admin = ArticleAdmin::new(&ArticleSettings::default());
/// assert_eq!(admin.list_display, vec!["title", "active"]);
/// assert_eq!(admin.prepopulated_fields["slug"], vec!["title"]);
/// assert_eq!(admin.fieldsets.len(), 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleAdmin {
    /// Admin base class configured for the site.
    pub model_admin_class: String,
    /// Columns of the change list.
    pub list_display: Vec<String>,
    /// Change list filters.
    pub list_filter: Vec<String>,
    /// Fields searched by the change list search box.
    pub search_fields: Vec<String>,
    /// Fields filled in from other fields while typing.
    pub prepopulated_fields: HashMap<String, Vec<String>>,
    /// Where extension fieldsets are inserted.
    pub fieldset_insertion_index: usize,
    /// Change form layout.
    pub fieldsets: Vec<Fieldset>,
}

impl ArticleAdmin {
    /// The admin without extensions.
    pub fn new(settings: &ArticleSettings) -> Self {
        Self {
            model_admin_class: settings.model_admin_class.clone(),
            list_display: vec!["title".to_string(), "active".to_string()],
            list_filter: Vec::new(),
            search_fields: vec!["title".to_string(), "slug".to_string()],
            prepopulated_fields: HashMap::from([(
                "slug".to_string(),
                vec!["title".to_string()],
            )]),
            fieldset_insertion_index: 2,
            fieldsets: vec![
                Fieldset::lines(vec![vec!["title", "slug"], vec!["active"]]),
                Fieldset::new(vec!["parent"])
                    .name("Other options")
                    .classes(vec!["collapse"]),
                Fieldset::new(Vec::new()).name(CONTENT_FIELDSET_NAME),
            ],
        }
    }

    /// The admin after every registered extension has added its options.
    pub fn with_extensions(settings: &ArticleSettings, extensions: &ExtensionRegistry) -> Self {
        let mut admin = Self::new(settings);
        extensions.apply_to_admin(&mut admin);
        admin
    }

    /// Inserts an extension fieldset at the insertion index. The index does
    /// not advance, so later extensions appear before earlier ones.
    pub fn add_extension_options(&mut self, fieldset: Fieldset) {
        let index = self.fieldset_insertion_index.min(self.fieldsets.len());
        self.fieldsets.insert(index, fieldset);
    }

    /// Every field shown in the change form.
    pub fn form_fields(&self) -> Vec<&str> {
        self.fieldsets.iter().flat_map(|f| f.field_names()).collect()
    }

    /// The change list row of an article, one cell per `list_display` entry.
    pub fn list_row(&self, article: &Article) -> Vec<String> {
        self.list_display
            .iter()
            .map(|field| article_field(article, field).unwrap_or_default())
            .collect()
    }

    /// Returns `true` if every whitespace-separated term of `query` occurs,
    /// ignoring case, in at least one of the search fields.
    pub fn matches_search(&self, article: &Article, query: &str) -> bool {
        let haystacks: Vec<String> = self
            .search_fields
            .iter()
            .filter_map(|field| article_field(article, field))
            .map(|value| value.to_lowercase())
            .collect();
        query.split_whitespace().all(|term| {
            let term = term.to_lowercase();
            haystacks.iter().any(|h| h.contains(&term))
        })
    }

    /// Fills empty prepopulated fields from their sources.
    pub fn prepopulate(&self, data: &mut HashMap<String, String>) {
        for (target, sources) in &self.prepopulated_fields {
            if data.get(target).is_some_and(|v| !v.trim().is_empty()) {
                continue;
            }
            let source = sources
                .iter()
                .filter_map(|s| data.get(s))
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            let slug = articles_rs_core::utils::text::slugify(&source);
            if !slug.is_empty() {
                data.insert(target.clone(), slug);
            }
        }
    }
}

fn article_field(article: &Article, field: &str) -> Option<String> {
    match field {
        "title" => Some(article.title.clone()),
        "slug" => Some(article.slug.clone()),
        "active" => Some(article.active.to_string()),
        "language" => Some(article.language.clone()),
        "author" => article.author.clone(),
        "parent" => article.parent_id.map(|id| id.to_string()),
        "category" => article.category_id.map(|id| id.to_string()),
        "publication_date" => article.publication_date.map(|d| d.to_rfc3339()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::{AuthorExtension, ExtensionRegistry};

    #[test]
    fn test_default_fieldsets() {
        let admin = ArticleAdmin::new(&ArticleSettings::default());
        assert_eq!(admin.fieldsets[0].lines, vec![vec!["title", "slug"], vec!["active"]]);
        assert_eq!(admin.fieldsets[1].name.as_deref(), Some("Other options"));
        assert!(admin.fieldsets[1].is_collapsed());
        assert_eq!(admin.fieldsets[2].name.as_deref(), Some(CONTENT_FIELDSET_NAME));
        assert_eq!(admin.form_fields(), vec!["title", "slug", "active", "parent"]);
    }

    #[test]
    fn test_model_admin_class_from_settings() {
        let settings = ArticleSettings {
            model_admin_class: "myproject.admin.Base".to_string(),
            ..ArticleSettings::default()
        };
        assert_eq!(ArticleAdmin::new(&settings).model_admin_class, "myproject.admin.Base");
    }

    #[test]
    fn test_author_fieldset_inserted_before_content() {
        let mut extensions = ExtensionRegistry::new();
        extensions.register(Box::new(AuthorExtension));
        let admin = ArticleAdmin::with_extensions(&ArticleSettings::default(), &extensions);
        let names: Vec<_> = admin.fieldsets.iter().map(|f| f.name.as_deref()).collect();
        assert_eq!(
            names,
            vec![None, Some("Other options"), Some("Author"), Some(CONTENT_FIELDSET_NAME)]
        );
        assert!(admin.fieldsets[2].is_collapsed());
    }

    #[test]
    fn test_later_extensions_insert_first() {
        let mut admin = ArticleAdmin::new(&ArticleSettings::default());
        admin.add_extension_options(Fieldset::new(vec!["a"]).name("A"));
        admin.add_extension_options(Fieldset::new(vec!["b"]).name("B"));
        assert_eq!(admin.fieldsets[2].name.as_deref(), Some("B"));
        assert_eq!(admin.fieldsets[3].name.as_deref(), Some("A"));
    }

    #[test]
    fn test_list_row_and_search() {
        let admin = ArticleAdmin::new(&ArticleSettings::default());
        let article = Article::new("Hello World", "hello-world");
        assert_eq!(admin.list_row(&article), vec!["Hello World", "true"]);
        assert!(admin.matches_search(&article, "hello"));
        assert!(admin.matches_search(&article, "WORLD hello-"));
        assert!(!admin.matches_search(&article, "hello moon"));
    }

    #[test]
    fn test_prepopulate_slug() {
        let admin = ArticleAdmin::new(&ArticleSettings::default());
        let mut data = HashMap::from([("title".to_string(), "Big News!".to_string())]);
        admin.prepopulate(&mut data);
        assert_eq!(data["slug"], "big-news");

        let mut data = HashMap::from([
            ("title".to_string(), "Big News".to_string()),
            ("slug".to_string(), "custom".to_string()),
        ]);
        admin.prepopulate(&mut data);
        assert_eq!(data["slug"], "custom");
    }
}
