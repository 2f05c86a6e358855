//! Template tags for listing articles and categories and for reversing
//! URLs inside mounted applications.
//!
//! ```
//! use std::sync::Arc;
//!
//! use articles_rs_app::models::{
//!     ApplicationContentBinding, Article, ArticleStore, CategoryStore, ContentBindingStore, Page,
//!     PageTree,
//! };
//! use articles_rs_app::reverse::AppReverser;
//! use articles_rs_app::templatetags::{Context, TagEnvironment, TagLibrary, TeraRenderer};
//! use articles_rs_app::urls::default_urlconfs;
//! use articles_rs_cache::{CacheGeneration, InMemoryCache};
//! use articles_rs_core::Settings;
//!
//! let settings = Settings::default();
//! let pages = Arc::new(PageTree::new());
//! pages.save(Page::new(1, "Blog", "blog")).unwrap();
//! let bindings = Arc::new(ContentBindingStore::new(Arc::clone(&pages)));
//! bindings.save(ApplicationContentBinding::new(1, 1, "articles.urls")).unwrap();
//! let articles = Arc::new(ArticleStore::new());
//! articles.save(Article::new("Hello", "hello")).unwrap();
//!
//! let cache = Arc::new(InMemoryCache::new());
//! let reverser = AppReverser::new(
//!     &settings,
//!     cache.clone(),
//!     Arc::new(CacheGeneration::new(cache)),
//!     Arc::new(default_urlconfs().unwrap()),
//!     bindings,
//! );
//! let env = Arc::new(TagEnvironment::new(
//!     &settings.articles,
//!     articles,
//!     Arc::new(CategoryStore::new()),
//!     reverser,
//!     Arc::new(TeraRenderer::new().unwrap()),
//! ));
//!
//! let library = TagLibrary::article(env);
//! let mut ctx = Context::new();
//! let url = library
//!     .render("{% articles_app_reverse 'article_detail' 'articles.urls' slug='hello' %}", &mut ctx)
//!     .unwrap();
//! assert_eq!(url, "/blog/hello/");
//! ```

pub mod article;
pub mod bits;
pub mod category;
pub mod context;
pub mod library;
pub mod render;

pub use article::{AppReverseNode, ArticlesNode, FilteredArticlesNode};
pub use category::CategoriesNode;
pub use context::Context;
pub use library::{Node, TagCompiler, TagEnvironment, TagLibrary};
pub use render::{TemplateRenderer, TeraRenderer, ARTICLES_TEMPLATE, CATEGORIES_TEMPLATE};

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use articles_rs_cache::{CacheGeneration, InMemoryCache};
    use articles_rs_core::Settings;

    use super::{TagEnvironment, TeraRenderer};
    use crate::models::{
        ApplicationContentBinding, Article, ArticleStore, Category, CategoryStore,
        ContentBindingStore, Page, PageTree,
    };
    use crate::reverse::AppReverser;
    use crate::urls::default_urlconfs;

    /// Pages `/news/` (articles) and `/topics/` (categories), five articles
    /// and four categories.
    pub(crate) fn environment() -> Arc<TagEnvironment> {
        let settings = Settings::default();

        let pages = Arc::new(PageTree::new());
        pages.save(Page::new(1, "News", "news")).unwrap();
        pages.save(Page::new(2, "Topics", "topics")).unwrap();
        let bindings = Arc::new(ContentBindingStore::new(Arc::clone(&pages)));
        bindings
            .save(ApplicationContentBinding::new(1, 1, "articles.urls"))
            .unwrap();
        bindings
            .save(ApplicationContentBinding::new(2, 2, "articles.category.urls"))
            .unwrap();

        let categories = Arc::new(CategoryStore::new());
        categories.save(Category::new(1, "Sport", "sport")).unwrap();
        categories
            .save(Category::new(2, "Football", "football").parent(1))
            .unwrap();
        categories
            .save(Category::new(3, "Members", "members").restricted(true))
            .unwrap();
        categories
            .save(Category::new(4, "Politics", "politics").order_by("-publication_date"))
            .unwrap();

        let articles = Arc::new(ArticleStore::new());
        for article in [
            Article::new("Alpha", "alpha").category(1).language("en"),
            Article::new("Beta", "beta").category(1).language("de"),
            Article::new("Gamma", "gamma").category(1).language("en").active(false),
            Article::new("Delta", "delta")
                .category(4)
                .language("en")
                .published(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()),
            Article::new("Epsilon", "epsilon")
                .category(4)
                .language("en")
                .published(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()),
        ] {
            articles.save(article).unwrap();
        }

        let cache = Arc::new(InMemoryCache::new());
        let reverser = AppReverser::new(
            &settings,
            cache.clone(),
            Arc::new(CacheGeneration::new(cache)),
            Arc::new(default_urlconfs().unwrap()),
            bindings,
        );

        Arc::new(TagEnvironment::new(
            &settings.articles,
            articles,
            categories,
            reverser,
            Arc::new(TeraRenderer::new().unwrap()),
        ))
    }
}
