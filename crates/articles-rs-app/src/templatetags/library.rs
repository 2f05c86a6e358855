//! Tag libraries: named collections of compiled template tags.
//!
//! A tag is compiled once from its source (`{% articles limit=3 %}`) into a
//! [`Node`] and rendered against a [`Context`] as often as needed. Two
//! libraries ship with the app:
//!
//! - `article`: `articles`, `articles_with_categoryslug` and
//!   `articles_app_reverse`.
//! - `articlecategory`: `articlecategories` and a language-aware
//!   `articles_with_categoryslug`.

use std::collections::HashMap;
use std::sync::Arc;

use articles_rs_core::settings::ArticleSettings;
use articles_rs_core::{ArticlesError, ArticlesResult};

use super::bits::split_contents;
use super::context::Context;
use super::render::TemplateRenderer;
use super::{article, category};
use crate::models::{ArticleStore, CategoryStore};
use crate::reverse::AppReverser;

/// A compiled tag.
pub trait Node: Send + Sync {
    /// Renders the tag. Tags that store their result with `as var` render
    /// an empty string.
    ///
    /// # Errors
    ///
    /// Lookup, reversal and template errors propagate.
    fn render(&self, context: &mut Context) -> ArticlesResult<String>;
}

/// Everything the tags read from at render time.
pub struct TagEnvironment {
    /// Article storage.
    pub articles: Arc<ArticleStore>,
    /// Category storage.
    pub categories: Arc<CategoryStore>,
    /// Reverser used for `articles_app_reverse` and canonical URLs.
    pub reverser: AppReverser,
    /// Renders the list templates.
    pub renderer: Arc<dyn TemplateRenderer>,
    /// Template used for article lists.
    pub list_template: String,
    /// Template used for category lists.
    pub categories_template: String,
}

impl std::fmt::Debug for TagEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagEnvironment")
            .field("reverser", &self.reverser)
            .field("list_template", &self.list_template)
            .field("categories_template", &self.categories_template)
            .finish_non_exhaustive()
    }
}

impl TagEnvironment {
    /// Creates an environment using the templates named in `settings`.
    pub fn new(
        settings: &ArticleSettings,
        articles: Arc<ArticleStore>,
        categories: Arc<CategoryStore>,
        reverser: AppReverser,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            articles,
            categories,
            reverser,
            renderer,
            list_template: settings.list_template.clone(),
            categories_template: settings.categories_template.clone(),
        }
    }
}

/// Compiles the split bits of one tag. `bits[0]` is the tag name.
pub type TagCompiler = fn(&Arc<TagEnvironment>, &[String]) -> ArticlesResult<Box<dyn Node>>;

/// A named collection of tags sharing one [`TagEnvironment`].
pub struct TagLibrary {
    name: String,
    env: Arc<TagEnvironment>,
    tags: HashMap<String, TagCompiler>,
}

impl std::fmt::Debug for TagLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagLibrary")
            .field("name", &self.name)
            .field("tags", &self.tag_names())
            .finish_non_exhaustive()
    }
}

impl TagLibrary {
    /// Creates an empty library.
    pub fn new(name: impl Into<String>, env: Arc<TagEnvironment>) -> Self {
        Self {
            name: name.into(),
            env,
            tags: HashMap::new(),
        }
    }

    /// The `article` library.
    pub fn article(env: Arc<TagEnvironment>) -> Self {
        let mut library = Self::new("article", env);
        library.register_tag("articles", article::compile_articles);
        library.register_tag(
            "articles_with_categoryslug",
            article::compile_articles_with_categoryslug,
        );
        library.register_tag("articles_app_reverse", article::compile_app_reverse);
        library
    }

    /// The `articlecategory` library.
    pub fn articlecategory(env: Arc<TagEnvironment>) -> Self {
        let mut library = Self::new("articlecategory", env);
        library.register_tag("articlecategories", category::compile_categories);
        library.register_tag(
            "articles_with_categoryslug",
            category::compile_articles_with_categoryslug,
        );
        library
    }

    /// The library name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers (or replaces) a tag.
    pub fn register_tag(&mut self, name: impl Into<String>, compiler: TagCompiler) {
        self.tags.insert(name.into(), compiler);
    }

    /// Returns `true` if the library defines `name`.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// Tag names, sorted.
    pub fn tag_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tags.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Compiles a tag from its source, with or without `{% %}`.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::TemplateSyntaxError`] for empty or unknown
    /// tags and malformed arguments.
    pub fn compile(&self, source: &str) -> ArticlesResult<Box<dyn Node>> {
        let bits = split_contents(source);
        let name = bits
            .first()
            .ok_or_else(|| ArticlesError::TemplateSyntaxError("Empty tag".to_string()))?;
        let compiler = self.tags.get(name).ok_or_else(|| {
            ArticlesError::TemplateSyntaxError(format!(
                "Invalid tag '{name}' in library '{}'",
                self.name
            ))
        })?;
        compiler(&self.env, &bits)
    }

    /// Compiles and renders a tag in one go.
    ///
    /// # Errors
    ///
    /// Compile and render errors propagate.
    pub fn render(&self, source: &str, context: &mut Context) -> ArticlesResult<String> {
        self.compile(source)?.render(context)
    }
}
