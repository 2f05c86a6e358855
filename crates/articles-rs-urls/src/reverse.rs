//! Reverse URL resolution.
//!
//! [`reverse`] builds a URL for a named pattern, optionally namespaced
//! (`"news:article_detail"`), and places it under a prefix. When a name
//! refers to an application namespace mounted several times, the
//! `current_app` hint picks the instance.

use std::collections::HashMap;

use articles_rs_core::{ArticlesError, ArticlesResult};

use super::resolver::{NamedRoute, URLResolver};

/// Extra parameters for [`reverse`] that do not identify the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReverseOptions<'a> {
    /// Prefix placed in front of the built path. `None` means `/`.
    pub prefix: Option<&'a str>,
    /// Preferred instance namespace when an application namespace is
    /// mounted more than once.
    pub current_app: Option<&'a str>,
}

impl<'a> ReverseOptions<'a> {
    /// Options with only a prefix.
    pub const fn with_prefix(prefix: &'a str) -> Self {
        Self {
            prefix: Some(prefix),
            current_app: None,
        }
    }

    /// Sets the current application hint.
    #[must_use]
    pub const fn current_app(mut self, current_app: Option<&'a str>) -> Self {
        self.current_app = current_app;
        self
    }
}

/// Generates a URL for a named view.
///
/// Named parameters take values from `kwargs` first, then from `args` in
/// order. Every rebuilt piece must match its pattern.
///
/// # Errors
///
/// Returns [`ArticlesError::NoReverseMatch`] if no pattern carries the name
/// or none of the candidates can be built from the given arguments.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use articles_rs_urls::pattern::path;
/// use articles_rs_urls::resolver::{include, root, URLEntry};
/// use articles_rs_urls::reverse::{reverse, ReverseOptions};
///
/// let resolver = root(vec![URLEntry::Resolver(
///     include(
///         "categories/",
///         vec![URLEntry::Pattern(path("<slug:category_url>/", Some("article_category")).unwrap())],
///         Some("categories"),
///         None,
///     )
///     .unwrap(),
/// )])
/// .unwrap();
///
/// let url = reverse(
///     "categories:article_category",
///     &["rust".to_string()],
///     &HashMap::new(),
///     &resolver,
///     &ReverseOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(url, "/categories/rust/");
/// ```
pub fn reverse(
    viewname: &str,
    args: &[String],
    kwargs: &HashMap<String, String>,
    resolver: &URLResolver,
    options: &ReverseOptions<'_>,
) -> ArticlesResult<String> {
    let mut parts: Vec<&str> = viewname.split(':').collect();
    let name = parts.pop().unwrap_or(viewname);
    let namespaces = parts;

    let mut candidates: Vec<(usize, usize, NamedRoute<'_>)> = resolver
        .named_routes()
        .into_iter()
        .enumerate()
        .filter(|(_, route)| route.name == name)
        .filter_map(|(position, route)| {
            rank(&route, &namespaces, options.current_app).map(|score| (score, position, route))
        })
        .collect();
    candidates.sort_by_key(|(score, position, _)| (*score, *position));

    let mut last_error = None;
    for (_, _, route) in &candidates {
        match build_route(route, args, kwargs) {
            Ok(path) => return Ok(join_prefix(options.prefix, &path)),
            Err(err) => last_error = Some(err),
        }
    }

    Err(match last_error {
        Some(ArticlesError::NoReverseMatch(reason)) => ArticlesError::NoReverseMatch(format!(
            "Reverse for '{viewname}' with arguments {args:?} and keyword arguments {kwargs:?} not found: {reason}"
        )),
        Some(other) => other,
        None => ArticlesError::NoReverseMatch(format!("Reverse for '{viewname}' not found")),
    })
}

/// Scores how well a route's namespace chain matches the requested one.
/// Lower is better; `None` means no match.
fn rank(route: &NamedRoute<'_>, namespaces: &[&str], current_app: Option<&str>) -> Option<usize> {
    if route.levels.len() != namespaces.len() {
        return None;
    }

    let mut score = 0;
    for (level, requested) in route.levels.iter().zip(namespaces) {
        score += if level.app == *requested && current_app == Some(level.instance) {
            0
        } else if level.instance == *requested {
            1
        } else if level.app == *requested {
            2
        } else {
            return None;
        };
    }
    Some(score)
}

fn build_route(
    route: &NamedRoute<'_>,
    args: &[String],
    kwargs: &HashMap<String, String>,
) -> ArticlesResult<String> {
    let mut cursor = 0;
    let mut path = String::new();
    for pattern in &route.chain {
        path.push_str(&pattern.build(args, &mut cursor, kwargs)?);
    }
    if cursor < args.len() {
        return Err(ArticlesError::NoReverseMatch(format!(
            "{} positional argument(s) left unused",
            args.len() - cursor
        )));
    }
    Ok(path)
}

/// Places `path` under `prefix` with exactly one `/` between them.
fn join_prefix(prefix: Option<&str>, path: &str) -> String {
    let prefix = prefix.filter(|p| !p.is_empty()).unwrap_or("/");
    let path = path.trim_start_matches('/');
    if prefix.ends_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{path, re_path};
    use crate::resolver::{include, root, URLEntry};

    fn article_patterns() -> Vec<URLEntry> {
        vec![
            URLEntry::Pattern(path("", Some("article_index")).unwrap()),
            URLEntry::Pattern(re_path(r"^(?P<slug>[a-z0-9_-]+)/$", Some("article_detail")).unwrap()),
        ]
    }

    fn slug(value: &str) -> HashMap<String, String> {
        let mut kwargs = HashMap::new();
        kwargs.insert("slug".to_string(), value.to_string());
        kwargs
    }

    #[test]
    fn test_reverse_with_default_prefix() {
        let resolver = root(article_patterns()).unwrap();
        let url = reverse("article_index", &[], &HashMap::new(), &resolver, &ReverseOptions::default())
            .unwrap();
        assert_eq!(url, "/");
    }

    #[test]
    fn test_reverse_with_prefix() {
        let resolver = root(article_patterns()).unwrap();
        let options = ReverseOptions::with_prefix("/en/news/");
        let url = reverse("article_detail", &[], &slug("hello"), &resolver, &options).unwrap();
        assert_eq!(url, "/en/news/hello/");
    }

    #[test]
    fn test_reverse_prefix_without_trailing_slash() {
        assert_eq!(join_prefix(Some("/news"), "hello/"), "/news/hello/");
        assert_eq!(join_prefix(Some(""), "hello/"), "/hello/");
        assert_eq!(join_prefix(None, ""), "/");
    }

    #[test]
    fn test_reverse_positional_argument() {
        let resolver = root(article_patterns()).unwrap();
        let url = reverse(
            "article_detail",
            &["hello".to_string()],
            &HashMap::new(),
            &resolver,
            &ReverseOptions::default(),
        )
        .unwrap();
        assert_eq!(url, "/hello/");
    }

    #[test]
    fn test_reverse_unused_positional_argument_fails() {
        let resolver = root(article_patterns()).unwrap();
        let result = reverse(
            "article_index",
            &["extra".to_string()],
            &HashMap::new(),
            &resolver,
            &ReverseOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_reverse_not_found() {
        let resolver = root(article_patterns()).unwrap();
        let err = reverse("missing", &[], &HashMap::new(), &resolver, &ReverseOptions::default())
            .unwrap_err();
        assert!(err.is_no_reverse_match());
    }

    #[test]
    fn test_reverse_invalid_kwarg() {
        let resolver = root(article_patterns()).unwrap();
        let err = reverse("article_detail", &[], &slug("Bad Slug"), &resolver, &ReverseOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("article_detail"));
    }

    fn two_instances() -> URLResolver {
        root(vec![
            URLEntry::Resolver(include("articles/", article_patterns(), Some("articles"), Some("articles")).unwrap()),
            URLEntry::Resolver(include("news/", article_patterns(), Some("news"), Some("articles")).unwrap()),
        ])
        .unwrap()
    }

    #[test]
    fn test_reverse_app_namespace_defaults_to_default_instance() {
        let resolver = two_instances();
        let url = reverse("articles:article_index", &[], &HashMap::new(), &resolver, &ReverseOptions::default())
            .unwrap();
        assert_eq!(url, "/articles/");
    }

    #[test]
    fn test_reverse_app_namespace_honours_current_app() {
        let resolver = two_instances();
        let options = ReverseOptions::default().current_app(Some("news"));
        let url = reverse("articles:article_detail", &[], &slug("x"), &resolver, &options).unwrap();
        assert_eq!(url, "/news/x/");
    }

    #[test]
    fn test_reverse_explicit_instance_namespace() {
        let resolver = two_instances();
        let url = reverse("news:article_index", &[], &HashMap::new(), &resolver, &ReverseOptions::default())
            .unwrap();
        assert_eq!(url, "/news/");
    }

    #[test]
    fn test_reverse_namespace_depth_must_match() {
        let resolver = two_instances();
        let result = reverse("article_index", &[], &HashMap::new(), &resolver, &ReverseOptions::default());
        assert!(result.is_err());
    }
}
