//! Application wiring.
//!
//! [`ArticlesApp`] owns the stores, the cache and the reverser, and connects
//! content signals to cache invalidation when it becomes ready.

use std::sync::Arc;

use articles_rs_cache::{
    backend_from_settings, cycle_app_reverse_cache, CacheBackend, CacheGeneration,
    GenerationRegistry,
};
use articles_rs_core::{ArticlesResult, Settings};
use articles_rs_signals::{BindingChanged, ContentSignals, PageChanged};
use articles_rs_urls::UrlconfRegistry;

use crate::admin::ArticleAdmin;
use crate::extensions::ExtensionRegistry;
use crate::forms::ArticleAdminForm;
use crate::models::{ArticleStore, CategoryStore, ContentBindingStore, PageTree};
use crate::reverse::AppReverser;
use crate::templatetags::{TagEnvironment, TagLibrary, TemplateRenderer, TeraRenderer};
use crate::urls::{default_urlconfs, ARTICLES_URLCONF};

/// Receiver id used for the cache invalidation hooks.
pub const CYCLE_RECEIVER_ID: &str = "articles.cycle_app_reverse_cache";

/// An installable application.
pub trait AppConfig: Send + Sync {
    /// Dotted name of the application.
    fn name(&self) -> &str;

    /// Short label: the last component of the name.
    fn label(&self) -> &str {
        self.name().rsplit('.').next().unwrap_or_else(|| self.name())
    }

    /// Human-readable name.
    fn verbose_name(&self) -> &str {
        self.name()
    }

    /// Called once after the application has been assembled.
    fn ready(&self) {}
}

/// The articles application.
///
/// # Examples
///
/// ```
/// use articles_rs_app::apps::{AppConfig, ArticlesApp};
/// use articles_rs_app::models::{ApplicationContentBinding, Page};
/// use articles_rs_core::Settings;
///
/// let app = ArticlesApp::new(Settings::default()).unwrap();
/// app.ready();
///
/// app.pages().save(Page::new(1, "News", "news")).unwrap();
/// app.bindings().save(ApplicationContentBinding::new(1, 1, "articles.urls")).unwrap();
/// assert!(app.generation().current().unwrap().is_some());
/// ```
pub struct ArticlesApp {
    settings: Settings,
    signals: Arc<ContentSignals>,
    cache: Arc<dyn CacheBackend>,
    generation: Arc<dyn GenerationRegistry>,
    pages: Arc<PageTree>,
    bindings: Arc<ContentBindingStore>,
    articles: Arc<ArticleStore>,
    categories: Arc<CategoryStore>,
    urlconfs: Arc<UrlconfRegistry>,
    extensions: ExtensionRegistry,
    renderer: Arc<dyn TemplateRenderer>,
    reverser: AppReverser,
}

impl std::fmt::Debug for ArticlesApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticlesApp")
            .field("site_id", &self.settings.site_id)
            .field("extensions", &self.extensions.names())
            .field("urlconfs", &self.urlconfs.urlconfs())
            .finish_non_exhaustive()
    }
}

impl ArticlesApp {
    /// Assembles the application from settings.
    ///
    /// # Errors
    ///
    /// Fails for an unknown cache backend or extension.
    pub fn new(settings: Settings) -> ArticlesResult<Self> {
        let cache = backend_from_settings(&settings.cache)?;
        let generation: Arc<dyn GenerationRegistry> =
            Arc::new(CacheGeneration::new(Arc::clone(&cache)));
        let signals = Arc::new(ContentSignals::new());
        let pages = Arc::new(PageTree::with_signals(Arc::clone(&signals)));
        let bindings = Arc::new(ContentBindingStore::with_signals(
            Arc::clone(&pages),
            Arc::clone(&signals),
        ));
        let urlconfs = Arc::new(default_urlconfs()?);
        let extensions = ExtensionRegistry::from_settings(&settings.articles)?;

        let reverser = AppReverser::new(
            &settings,
            Arc::clone(&cache),
            Arc::clone(&generation),
            Arc::clone(&urlconfs) as _,
            Arc::clone(&bindings) as _,
        );

        tracing::info!(
            site_id = settings.site_id,
            cache = %settings.cache.backend,
            extensions = ?extensions.names(),
            "articles app assembled"
        );

        Ok(Self {
            signals,
            cache,
            generation,
            pages,
            bindings,
            articles: Arc::new(ArticleStore::new()),
            categories: Arc::new(CategoryStore::new()),
            urlconfs,
            extensions,
            renderer: Arc::new(TeraRenderer::new()?),
            reverser,
            settings,
        })
    }

    /// Replaces the template renderer used by the tag libraries.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Settings the application was built from.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Content change signals.
    pub fn signals(&self) -> &Arc<ContentSignals> {
        &self.signals
    }

    /// The shared cache.
    pub fn cache(&self) -> &Arc<dyn CacheBackend> {
        &self.cache
    }

    /// The reverse cache generation.
    pub fn generation(&self) -> &Arc<dyn GenerationRegistry> {
        &self.generation
    }

    /// The page tree.
    pub fn pages(&self) -> &Arc<PageTree> {
        &self.pages
    }

    /// Application content bindings.
    pub fn bindings(&self) -> &Arc<ContentBindingStore> {
        &self.bindings
    }

    /// Articles.
    pub fn articles(&self) -> &Arc<ArticleStore> {
        &self.articles
    }

    /// Categories.
    pub fn categories(&self) -> &Arc<CategoryStore> {
        &self.categories
    }

    /// Enabled extensions.
    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Application-aware reverser.
    pub fn reverser(&self) -> &AppReverser {
        &self.reverser
    }

    /// The registered urlconfs.
    pub fn urlconfs(&self) -> &UrlconfRegistry {
        &self.urlconfs
    }

    /// Article admin with every extension applied.
    pub fn admin(&self) -> ArticleAdmin {
        ArticleAdmin::with_extensions(&self.settings.articles, &self.extensions)
    }

    /// A blank article change form.
    pub fn admin_form(&self) -> ArticleAdminForm {
        ArticleAdminForm::new(
            Arc::clone(&self.articles),
            Arc::new(self.extensions.model().clone()),
        )
    }

    /// Environment shared by the tag libraries.
    pub fn tag_environment(&self) -> Arc<TagEnvironment> {
        Arc::new(TagEnvironment::new(
            &self.settings.articles,
            Arc::clone(&self.articles),
            Arc::clone(&self.categories),
            self.reverser.clone(),
            Arc::clone(&self.renderer),
        ))
    }

    /// The `article` tag library.
    pub fn article_tags(&self) -> TagLibrary {
        TagLibrary::article(self.tag_environment())
    }

    /// The `articlecategory` tag library.
    pub fn category_tags(&self) -> TagLibrary {
        TagLibrary::articlecategory(self.tag_environment())
    }

    /// Reports configuration problems: bindings to unknown urlconfs, bindings
    /// on inactive pages, application overrides pointing to unknown urlconfs
    /// and active articles whose URL does not resolve back to them.
    pub fn check(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for binding in self.bindings.all() {
            if !self.urlconfs.contains(&binding.urlconf_path) {
                problems.push(format!(
                    "Binding {} mounts unknown urlconf '{}'",
                    binding.id, binding.urlconf_path
                ));
            }
            if !self.pages.is_active(binding.parent) {
                problems.push(format!(
                    "Binding {} is on inactive page {}",
                    binding.id, binding.parent
                ));
            }
        }
        for app in &self.settings.articles.applications {
            if let Some(urls) = &app.urls {
                if !self.urlconfs.contains(urls) {
                    problems.push(format!(
                        "Application '{}' overrides '{}' with unknown urlconf '{urls}'",
                        app.name, app.urlconf
                    ));
                }
            }
        }
        problems.extend(self.check_article_urls());
        for problem in &problems {
            tracing::warn!(problem = %problem, "articles check");
        }
        problems
    }

    /// Reverses every active article and resolves the result inside the
    /// mounted urlconf. Skipped while the articles urlconf is not mounted.
    fn check_article_urls(&self) -> Vec<String> {
        let Ok(mount) = self.reverser.mount(ARTICLES_URLCONF, None) else {
            return Vec::new();
        };
        if !self.urlconfs.contains(&mount.urlconf) {
            return Vec::new();
        }

        let mut problems = Vec::new();
        for article in self.articles.active() {
            let url = match self.reverser.canonical_url(&article) {
                Ok(url) => url,
                Err(err) => {
                    problems.push(format!("Article '{}' has no URL: {err}", article.slug));
                    continue;
                }
            };
            let resolves_back = url
                .strip_prefix(&mount.prefix)
                .and_then(|path| self.urlconfs.resolve(&mount.urlconf, path).ok())
                .is_some_and(|found| {
                    found.url_name.as_deref() == Some("article_detail")
                        && found.kwargs.get("slug") == Some(&article.slug)
                });
            if !resolves_back {
                problems.push(format!(
                    "Article '{}' reverses to {url}, which does not resolve back to it",
                    article.slug
                ));
            }
        }
        problems
    }
}

impl AppConfig for ArticlesApp {
    fn name(&self) -> &str {
        "articles"
    }

    fn verbose_name(&self) -> &str {
        "Articles"
    }

    /// Connects cache invalidation to every content signal. Calling it again
    /// replaces the receivers.
    fn ready(&self) {
        let generation = Arc::clone(&self.generation);
        self.signals.binding_saved.connect(
            CYCLE_RECEIVER_ID,
            Arc::new(move |changed: &BindingChanged| {
                tracing::debug!(binding = changed.binding_id, "binding saved");
                cycle_app_reverse_cache(generation.as_ref());
                None
            }),
        );

        let generation = Arc::clone(&self.generation);
        self.signals.binding_deleted.connect(
            CYCLE_RECEIVER_ID,
            Arc::new(move |changed: &BindingChanged| {
                tracing::debug!(binding = changed.binding_id, "binding deleted");
                cycle_app_reverse_cache(generation.as_ref());
                None
            }),
        );

        let generation = Arc::clone(&self.generation);
        self.signals.page_saved.connect(
            CYCLE_RECEIVER_ID,
            Arc::new(move |changed: &PageChanged| {
                tracing::debug!(page = changed.page_id, "page saved");
                cycle_app_reverse_cache(generation.as_ref());
                None
            }),
        );
    }
}
