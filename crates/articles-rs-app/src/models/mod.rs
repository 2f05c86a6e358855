//! Content models and their in-memory stores.
//!
//! - [`page`] - The CMS page tree application content is mounted on
//! - [`content`] - Application content bindings and closest-match lookup
//! - [`article`] - Articles
//! - [`category`] - Hierarchical article categories

pub mod article;
pub mod category;
pub mod content;
pub mod page;

pub use article::{Article, ArticleStore};
pub use category::{Category, CategoryStore};
pub use content::{ActiveBindingFinder, ApplicationContentBinding, BindingMatch, ContentBindingStore};
pub use page::{Page, PageTree};
