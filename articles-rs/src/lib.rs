//! # articles-rs
//!
//! Articles and categories for a page-tree CMS, and URL reversal for views
//! of applications mounted on pages.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on
//! `articles-rs` to get everything, or on individual crates for finer-grained
//! control.
//!
//! ```rust
//! use articles_rs::app::models::{ApplicationContentBinding, Page};
//! use articles_rs::app::{AppConfig, ArticlesApp, ReverseArgs, UrlconfSource};
//! use articles_rs::Settings;
//!
//! let app = ArticlesApp::new(Settings::default()).unwrap();
//! app.ready();
//! app.pages().save(Page::new(1, "Blog", "blog")).unwrap();
//! app.bindings()
//!     .save(ApplicationContentBinding::new(1, 1, "articles.urls"))
//!     .unwrap();
//!
//! let url = app
//!     .reverser()
//!     .reverse(
//!         "article_detail",
//!         UrlconfSource::Path("articles.urls"),
//!         ReverseArgs::new().kwarg("slug", "hello"),
//!     )
//!     .unwrap();
//! assert_eq!(url, "/blog/hello/");
//! ```

/// Errors, settings, logging, i18n and text utilities.
pub use articles_rs_core as core;

/// URL patterns, resolvers and the urlconf registry.
#[cfg(feature = "urls")]
pub use articles_rs_urls as urls;

/// Cache backends and the app reverse cache generation.
#[cfg(feature = "cache")]
pub use articles_rs_cache as cache;

/// Content change signals.
#[cfg(feature = "signals")]
pub use articles_rs_signals as signals;

/// Models, application reversal, template tags, admin and app wiring.
#[cfg(feature = "app")]
pub use articles_rs_app as app;

/// The `articles` command line.
#[cfg(feature = "cli")]
pub use articles_rs_cli as cli;

pub use articles_rs_core::{ArticlesError, ArticlesResult, Settings};

// Third-party re-exports
pub use serde;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;
