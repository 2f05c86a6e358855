//! # articles-rs-urls
//!
//! URL routing for articles-rs:
//!
//! - [`pattern`]: route definitions via [`path`](pattern::path) and [`re_path`](pattern::re_path)
//! - [`converters`]: path converters (`int`, `str`, `slug`, `uuid`, `path`)
//! - [`resolver`]: nested resolvers with instance and application namespaces
//! - [`reverse`]: building URLs from pattern names, under an optional prefix
//! - [`registry`]: named URL configurations and the [`Router`] trait
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//! use articles_rs_urls::pattern::{path, re_path};
//! use articles_rs_urls::resolver::{root, URLEntry};
//! use articles_rs_urls::reverse::{reverse, ReverseOptions};
//!
//! let resolver = root(vec![
//!     URLEntry::Pattern(path("", Some("article_index")).unwrap()),
//!     URLEntry::Pattern(re_path(r"^(?P<slug>[a-z0-9_-]+)/$", Some("article_detail")).unwrap()),
//! ])
//! .unwrap();
//!
//! let mut kwargs = HashMap::new();
//! kwargs.insert("slug".to_string(), "hello".to_string());
//! let options = ReverseOptions::with_prefix("/news/");
//! let url = reverse("article_detail", &[], &kwargs, &resolver, &options).unwrap();
//! assert_eq!(url, "/news/hello/");
//! ```

pub mod converters;
pub mod pattern;
pub mod registry;
pub mod resolver;
pub mod reverse;

pub use registry::{Router, UrlconfRegistry};
pub use reverse::ReverseOptions;
