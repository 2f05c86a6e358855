//! # articles-rs-app
//!
//! The articles application: content models, application-aware URL
//! reversal, template tags, admin configuration and the app wiring that
//! ties them together.
//!
//! ## Modules
//!
//! - [`models`] - Pages, application content bindings, articles and categories
//! - [`reverse`] - [`AppReverser`](reverse::AppReverser), reversal inside mounted applications
//! - [`urls`] - The `articles.urls` and `articles.category.urls` urlconfs
//! - [`templatetags`] - `article` and `articlecategory` tag libraries
//! - [`admin`] - Article admin configuration
//! - [`extensions`] - Model extensions such as the author field
//! - [`forms`] - The article change form
//! - [`apps`] - [`ArticlesApp`](apps::ArticlesApp) and signal hookup
//! - [`fixture`] - Loading content from JSON

pub mod admin;
pub mod apps;
pub mod extensions;
pub mod fixture;
pub mod forms;
pub mod models;
pub mod reverse;
pub mod templatetags;
pub mod urls;

pub use apps::{AppConfig, ArticlesApp};
pub use fixture::Fixture;
pub use reverse::{AppReverser, CanonicalUrl, ReverseArgs, UrlSpec, UrlconfSource};
