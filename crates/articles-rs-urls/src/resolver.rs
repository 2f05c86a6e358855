//! URL resolver and namespace support.
//!
//! [`URLResolver`] matches a prefix and delegates the rest of the path to its
//! children; [`include`] and [`root`] build resolvers. Each resolver may carry
//! an instance namespace and an application namespace, which reversing uses
//! to pick between several mounts of the same application.

use std::collections::HashMap;
use std::fmt;

use articles_rs_core::{ArticlesError, ArticlesResult};

use super::pattern::{self, URLPattern};

/// The result of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverMatch {
    /// Positional values from unnamed regex groups.
    pub args: Vec<String>,
    /// Named values extracted from the path (prefix captures included).
    pub kwargs: HashMap<String, String>,
    /// The name of the matched pattern, if any.
    pub url_name: Option<String>,
    /// Application namespaces in the resolution chain (outermost first).
    pub app_names: Vec<String>,
    /// Instance namespaces in the resolution chain (outermost first).
    pub namespaces: Vec<String>,
    /// The concatenated routes of the chain.
    pub route: String,
}

impl ResolverMatch {
    /// Returns the fully-qualified view name, e.g. `"news:article_detail"`.
    pub fn view_name(&self) -> String {
        let mut parts: Vec<&str> = self.namespaces.iter().map(String::as_str).collect();
        if let Some(name) = &self.url_name {
            parts.push(name);
        }
        parts.join(":")
    }
}

/// An entry in a URL configuration: a leaf pattern or a nested resolver.
pub enum URLEntry {
    /// A leaf URL pattern.
    Pattern(URLPattern),
    /// A nested resolver, typically created via [`include`].
    Resolver(URLResolver),
}

impl fmt::Debug for URLEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(p) => f.debug_tuple("Pattern").field(p).finish(),
            Self::Resolver(r) => f.debug_tuple("Resolver").field(r).finish(),
        }
    }
}

/// One namespaced level on the way to a named pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceLevel<'a> {
    /// The instance namespace.
    pub instance: &'a str,
    /// The application namespace; equals `instance` when none was given.
    pub app: &'a str,
}

/// A named leaf pattern together with the chain of patterns leading to it.
#[derive(Debug, Clone)]
pub struct NamedRoute<'a> {
    /// The pattern name.
    pub name: &'a str,
    /// Namespaced levels, outermost first.
    pub levels: Vec<NamespaceLevel<'a>>,
    /// Prefix patterns of every enclosing resolver, then the leaf.
    pub chain: Vec<&'a URLPattern>,
}

/// A URL resolver that matches a prefix and delegates to child patterns.
pub struct URLResolver {
    pattern: URLPattern,
    url_patterns: Vec<URLEntry>,
    namespace: Option<String>,
    app_name: Option<String>,
}

impl fmt::Debug for URLResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("URLResolver")
            .field("pattern", &self.pattern)
            .field("url_patterns", &self.url_patterns)
            .field("namespace", &self.namespace)
            .field("app_name", &self.app_name)
            .finish()
    }
}

impl URLResolver {
    /// Creates a new resolver with the given prefix pattern and child entries.
    pub fn new(
        pattern: URLPattern,
        url_patterns: Vec<URLEntry>,
        namespace: Option<&str>,
        app_name: Option<&str>,
    ) -> Self {
        Self {
            pattern,
            url_patterns,
            namespace: namespace.map(String::from),
            app_name: app_name.map(String::from),
        }
    }

    /// Returns the prefix pattern.
    pub const fn pattern(&self) -> &URLPattern {
        &self.pattern
    }

    /// Returns the child URL entries.
    pub fn url_patterns(&self) -> &[URLEntry] {
        &self.url_patterns
    }

    /// Returns the instance namespace, if set.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the application namespace, if set.
    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    /// Resolves a path (without leading slash) to a [`ResolverMatch`].
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::DoesNotExist`] if no pattern matches the path.
    pub fn resolve(&self, path: &str) -> ArticlesResult<ResolverMatch> {
        let not_found =
            || ArticlesError::DoesNotExist(format!("No URL pattern matches '{path}'"));

        let (prefix, remaining) = self.pattern.match_path(path).ok_or_else(not_found)?;

        for entry in &self.url_patterns {
            let found = match entry {
                URLEntry::Pattern(child) => {
                    child.full_match(&remaining).map(|captures| ResolverMatch {
                        args: captures.args,
                        kwargs: captures.kwargs,
                        url_name: child.name().map(String::from),
                        app_names: Vec::new(),
                        namespaces: Vec::new(),
                        route: child.route().to_string(),
                    })
                }
                URLEntry::Resolver(child) => child.resolve(&remaining).ok(),
            };

            if let Some(mut resolved) = found {
                for (k, v) in &prefix.kwargs {
                    resolved.kwargs.entry(k.clone()).or_insert_with(|| v.clone());
                }
                let mut args = prefix.args.clone();
                args.append(&mut resolved.args);
                resolved.args = args;

                if let Some(ns) = &self.namespace {
                    resolved.namespaces.insert(0, ns.clone());
                    resolved
                        .app_names
                        .insert(0, self.app_name.clone().unwrap_or_else(|| ns.clone()));
                }
                resolved.route = format!("{}{}", self.pattern.route(), resolved.route);
                return Ok(resolved);
            }
        }

        Err(not_found())
    }

    /// Collects every named leaf pattern in declaration order.
    pub fn named_routes(&self) -> Vec<NamedRoute<'_>> {
        let mut result = Vec::new();
        self.collect_named_routes(&mut result, &[], &[]);
        result
    }

    fn collect_named_routes<'a>(
        &'a self,
        result: &mut Vec<NamedRoute<'a>>,
        parent_levels: &[NamespaceLevel<'a>],
        parent_chain: &[&'a URLPattern],
    ) {
        let mut levels = parent_levels.to_vec();
        if let Some(ns) = self.namespace.as_deref() {
            levels.push(NamespaceLevel {
                instance: ns,
                app: self.app_name.as_deref().unwrap_or(ns),
            });
        }

        let mut chain = parent_chain.to_vec();
        chain.push(&self.pattern);

        for entry in &self.url_patterns {
            match entry {
                URLEntry::Pattern(child) => {
                    if let Some(name) = child.name() {
                        let mut full_chain = chain.clone();
                        full_chain.push(child);
                        result.push(NamedRoute {
                            name,
                            levels: levels.clone(),
                            chain: full_chain,
                        });
                    }
                }
                URLEntry::Resolver(child) => child.collect_named_routes(result, &levels, &chain),
            }
        }
    }
}

/// Creates a nested resolver mounted under `prefix`.
///
/// # Errors
///
/// Returns an error if the prefix route is invalid.
pub fn include(
    prefix: &str,
    patterns: Vec<URLEntry>,
    namespace: Option<&str>,
    app_name: Option<&str>,
) -> ArticlesResult<URLResolver> {
    let prefix_pattern = pattern::path_prefix(prefix)?;
    Ok(URLResolver::new(prefix_pattern, patterns, namespace, app_name))
}

/// Creates a root resolver (matches the empty prefix).
///
/// # Errors
///
/// Returns an error if pattern creation fails.
pub fn root(patterns: Vec<URLEntry>) -> ArticlesResult<URLResolver> {
    let prefix_pattern = pattern::path_prefix("")?;
    Ok(URLResolver::new(prefix_pattern, patterns, None, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{path, re_path};

    fn article_patterns() -> Vec<URLEntry> {
        vec![
            URLEntry::Pattern(path("", Some("article_index")).unwrap()),
            URLEntry::Pattern(re_path(r"^(?P<slug>[a-z0-9_-]+)/$", Some("article_detail")).unwrap()),
        ]
    }

    #[test]
    fn test_resolve_simple() {
        let resolver = root(article_patterns()).unwrap();
        let m = resolver.resolve("").unwrap();
        assert_eq!(m.url_name.as_deref(), Some("article_index"));

        let m = resolver.resolve("hello/").unwrap();
        assert_eq!(m.url_name.as_deref(), Some("article_detail"));
        assert_eq!(m.kwargs.get("slug").map(String::as_str), Some("hello"));
    }

    #[test]
    fn test_resolve_nested_namespace() {
        let resolver = root(vec![URLEntry::Resolver(
            include("news/", article_patterns(), Some("news"), Some("articles")).unwrap(),
        )])
        .unwrap();

        let m = resolver.resolve("news/hello/").unwrap();
        assert_eq!(m.view_name(), "news:article_detail");
        assert_eq!(m.app_names, vec!["articles".to_string()]);
        assert_eq!(m.route, r"news/^(?P<slug>[a-z0-9_-]+)/$");
    }

    #[test]
    fn test_resolve_prefix_kwargs_are_merged() {
        let inner = vec![URLEntry::Pattern(path("info/", Some("info")).unwrap())];
        let resolver = root(vec![URLEntry::Resolver(
            include("users/<int:id>/", inner, None, None).unwrap(),
        )])
        .unwrap();

        let m = resolver.resolve("users/42/info/").unwrap();
        assert_eq!(m.kwargs.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn test_resolve_not_found() {
        let resolver = root(article_patterns()).unwrap();
        let err = resolver.resolve("Bad Slug/").unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_named_routes_levels() {
        let resolver = root(vec![
            URLEntry::Resolver(include("news/", article_patterns(), Some("news"), Some("articles")).unwrap()),
            URLEntry::Resolver(include("blog/", article_patterns(), Some("blog"), None).unwrap()),
        ])
        .unwrap();

        let routes = resolver.named_routes();
        assert_eq!(routes.len(), 4);
        assert_eq!(routes[0].levels[0].instance, "news");
        assert_eq!(routes[0].levels[0].app, "articles");
        assert_eq!(routes[2].levels[0].app, "blog");
        // root prefix + include prefix + leaf
        assert_eq!(routes[1].chain.len(), 3);
    }
}
