//! Rendering the list templates used by the tags.

use tera::Tera;

use articles_rs_core::{ArticlesError, ArticlesResult};

use super::context::Context;

/// Default template for article lists.
pub const ARTICLES_TEMPLATE: &str = "articles/articles.html";

/// Default template for category lists.
pub const CATEGORIES_TEMPLATE: &str = "articles/categories.html";

/// Renders a named template with a tag context.
pub trait TemplateRenderer: Send + Sync {
    /// Renders `template` with every variable visible in `context`.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::TemplateError`] if the template is unknown
    /// or fails to render.
    fn render(&self, template: &str, context: &Context) -> ArticlesResult<String>;
}

fn template_error(err: &tera::Error) -> ArticlesError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    ArticlesError::TemplateError(message)
}

/// A [`TemplateRenderer`] backed by Tera, preloaded with the default
/// article and category templates.
///
/// ```
/// use articles_rs_app::templatetags::{Context, TemplateRenderer, TeraRenderer};
/// use serde_json::json;
///
/// let mut renderer = TeraRenderer::new().unwrap();
/// renderer.add_template("hello.html", "Hello {{ name }}").unwrap();
/// let ctx = Context::from_value(json!({"name": "articles"}));
/// assert_eq!(renderer.render("hello.html", &ctx).unwrap(), "Hello articles");
/// ```
#[derive(Debug)]
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    /// Creates a renderer with the default templates.
    ///
    /// # Errors
    ///
    /// Fails only if a default template does not parse.
    pub fn new() -> ArticlesResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (
                ARTICLES_TEMPLATE,
                include_str!("../../templates/articles/articles.html"),
            ),
            (
                CATEGORIES_TEMPLATE,
                include_str!("../../templates/articles/categories.html"),
            ),
        ])
        .map_err(|e| template_error(&e))?;
        Ok(Self { tera })
    }

    /// Adds or replaces a template.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::TemplateSyntaxError`] if the source does not
    /// parse.
    pub fn add_template(&mut self, name: &str, source: &str) -> ArticlesResult<()> {
        self.tera
            .add_raw_template(name, source)
            .map_err(|e| ArticlesError::TemplateSyntaxError(template_error(&e).to_string()))
    }

    /// Adds every file under `dir` as a template named by its path relative
    /// to `dir`, replacing defaults with the same name.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be read or a template does not parse.
    pub fn add_template_dir(&mut self, dir: &std::path::Path) -> ArticlesResult<()> {
        let mut files = Vec::new();
        collect_files(dir, dir, &mut files)?;
        for (name, path) in files {
            let source = std::fs::read_to_string(&path)?;
            tracing::debug!(template = %name, "template override loaded");
            self.add_template(&name, &source)?;
        }
        Ok(())
    }

    /// Names of the registered templates, sorted.
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tera.get_template_names().map(str::to_string).collect();
        names.sort();
        names
    }
}

fn collect_files(
    root: &std::path::Path,
    dir: &std::path::Path,
    files: &mut Vec<(String, std::path::PathBuf)>,
) -> ArticlesResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, files)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            files.push((name, path));
        }
    }
    Ok(())
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, template: &str, context: &Context) -> ArticlesResult<String> {
        let tera_context =
            tera::Context::from_value(context.flatten()).map_err(|e| template_error(&e))?;
        self.tera
            .render(template, &tera_context)
            .map_err(|e| template_error(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_templates_registered() {
        let renderer = TeraRenderer::new().unwrap();
        assert_eq!(
            renderer.template_names(),
            vec![ARTICLES_TEMPLATE.to_string(), CATEGORIES_TEMPLATE.to_string()]
        );
    }

    #[test]
    fn test_render_articles_template() {
        let renderer = TeraRenderer::new().unwrap();
        let ctx = Context::from_value(json!({
            "articles": [
                {"title": "First", "url": "/news/first/"},
                {"title": "Second & more"},
            ],
        }));
        let html = renderer.render(ARTICLES_TEMPLATE, &ctx).unwrap();
        assert!(html.contains(r#"<a href="/news/first/">First</a>"#));
        assert!(html.contains("Second &amp; more"));
    }

    #[test]
    fn test_render_empty_list() {
        let renderer = TeraRenderer::new().unwrap();
        let ctx = Context::from_value(json!({"categories": null, "selected": null}));
        assert_eq!(renderer.render(CATEGORIES_TEMPLATE, &ctx).unwrap().trim(), "");
    }

    #[test]
    fn test_unknown_template() {
        let renderer = TeraRenderer::new().unwrap();
        let err = renderer.render("missing.html", &Context::new()).unwrap_err();
        assert!(matches!(err, ArticlesError::TemplateError(_)));
    }

    #[test]
    fn test_override_and_syntax_error() {
        let mut renderer = TeraRenderer::new().unwrap();
        renderer.add_template(ARTICLES_TEMPLATE, "{{ articles | length }}").unwrap();
        let ctx = Context::from_value(json!({"articles": [1, 2]}));
        assert_eq!(renderer.render(ARTICLES_TEMPLATE, &ctx).unwrap(), "2");
        assert!(renderer.add_template("bad.html", "{% if %}").is_err());
    }
}
