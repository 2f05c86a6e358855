//! Tags of the `article` library.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use articles_rs_core::{i18n, ArticlesError, ArticlesResult};

use super::bits::{
    bind_params, parse_bit, parse_tokens, split_as_var, value_to_string, FilterExpression,
};
use super::context::Context;
use super::library::{Node, TagEnvironment};
use crate::models::Article;
use crate::reverse::{ReverseArgs, UrlconfSource};

pub(crate) fn tag_name(bits: &[String]) -> &str {
    bits.first().map_or("", String::as_str)
}

/// Resolves an optional `limit` argument.
pub(crate) fn resolve_limit(
    limit: Option<&FilterExpression>,
    context: &Context,
) -> ArticlesResult<Option<usize>> {
    let Some(expr) = limit else {
        return Ok(None);
    };
    match expr.resolve(context) {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| ArticlesError::TemplateError(format!("Invalid limit {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ArticlesError::TemplateError(format!("Invalid limit '{s}'"))),
        other => Err(ArticlesError::TemplateError(format!("Invalid limit {other}"))),
    }
}

/// Resolves an optional list of articles supplied by the template.
pub(crate) fn resolve_supplied(
    articles: Option<&FilterExpression>,
    context: &Context,
) -> ArticlesResult<Option<Vec<Value>>> {
    let Some(expr) = articles else {
        return Ok(None);
    };
    match expr.resolve(context) {
        Value::Null => Ok(None),
        Value::Array(items) => Ok(Some(items)),
        other => Err(ArticlesError::TemplateError(format!(
            "Expected a list of articles, got {other}"
        ))),
    }
}

/// Serializes articles for the template, each with its canonical `url` when
/// one can be reversed.
pub(crate) fn article_values(
    env: &TagEnvironment,
    articles: Vec<Article>,
) -> ArticlesResult<Vec<Value>> {
    articles
        .into_iter()
        .map(|article| {
            let url = env.reverser.canonical_url(&article).ok();
            let mut value = serde_json::to_value(&article)?;
            if let (Value::Object(map), Some(url)) = (&mut value, url) {
                map.insert("url".to_string(), Value::String(url));
            }
            Ok(value)
        })
        .collect()
}

/// Stores the list under `asvar`, or renders the article list template.
pub(crate) fn output_articles(
    env: &TagEnvironment,
    context: &mut Context,
    mut articles: Vec<Value>,
    limit: Option<usize>,
    asvar: Option<&str>,
) -> ArticlesResult<String> {
    if let Some(limit) = limit {
        articles.truncate(limit);
    }
    if let Some(var) = asvar {
        context.set(var, Value::Array(articles));
        return Ok(String::new());
    }
    context.push();
    context.set("articles", Value::Array(articles));
    let output = env.renderer.render(&env.list_template, context);
    context.pop();
    output
}

/// `{% articles [articles] [limit] [as var] %}`
pub struct ArticlesNode {
    env: Arc<TagEnvironment>,
    articles: Option<FilterExpression>,
    limit: Option<FilterExpression>,
    asvar: Option<String>,
}

impl Node for ArticlesNode {
    fn render(&self, context: &mut Context) -> ArticlesResult<String> {
        let limit = resolve_limit(self.limit.as_ref(), context)?;
        let articles = match resolve_supplied(self.articles.as_ref(), context)? {
            Some(articles) => articles,
            None => article_values(&self.env, self.env.articles.active())?,
        };
        output_articles(&self.env, context, articles, limit, self.asvar.as_deref())
    }
}

pub(crate) fn compile_articles(
    env: &Arc<TagEnvironment>,
    bits: &[String],
) -> ArticlesResult<Box<dyn Node>> {
    let (bits, asvar) = split_as_var(bits.to_vec());
    let mut params = bind_params(tag_name(&bits), &["articles", "limit"], parse_tokens(&bits)?)?;
    Ok(Box::new(ArticlesNode {
        env: Arc::clone(env),
        articles: params.remove("articles"),
        limit: params.remove("limit"),
        asvar,
    }))
}

/// `{% articles_with_categoryslug category_slug [articles] [limit] [as var] %}`
///
/// The category is always looked up, even when a list is supplied.
pub struct FilteredArticlesNode {
    env: Arc<TagEnvironment>,
    category_slug: Option<FilterExpression>,
    articles: Option<FilterExpression>,
    limit: Option<FilterExpression>,
    asvar: Option<String>,
    current_language_only: bool,
}

impl FilteredArticlesNode {
    pub(crate) fn compile(
        env: &Arc<TagEnvironment>,
        bits: &[String],
        current_language_only: bool,
    ) -> ArticlesResult<Self> {
        let (bits, asvar) = split_as_var(bits.to_vec());
        let mut params = bind_params(
            tag_name(&bits),
            &["category_slug", "articles", "limit"],
            parse_tokens(&bits)?,
        )?;
        Ok(Self {
            env: Arc::clone(env),
            category_slug: params.remove("category_slug"),
            articles: params.remove("articles"),
            limit: params.remove("limit"),
            asvar,
            current_language_only,
        })
    }
}

impl Node for FilteredArticlesNode {
    fn render(&self, context: &mut Context) -> ArticlesResult<String> {
        let supplied = resolve_supplied(self.articles.as_ref(), context)?;
        let limit = resolve_limit(self.limit.as_ref(), context)?;
        let slug = self
            .category_slug
            .as_ref()
            .map(|expr| value_to_string(&expr.resolve(context)))
            .unwrap_or_default();
        let category = self.env.categories.get_by_slug_iexact(&slug)?;

        let articles = match supplied {
            Some(articles) => articles,
            None => {
                let mut articles = self.env.articles.by_category(category.id, &category.order_by)?;
                if self.current_language_only {
                    let language = i18n::get_language();
                    articles.retain(|a| a.language == language);
                }
                tracing::debug!(
                    category = %category.slug,
                    count = articles.len(),
                    "category articles selected"
                );
                article_values(&self.env, articles)?
            }
        };
        output_articles(&self.env, context, articles, limit, self.asvar.as_deref())
    }
}

pub(crate) fn compile_articles_with_categoryslug(
    env: &Arc<TagEnvironment>,
    bits: &[String],
) -> ArticlesResult<Box<dyn Node>> {
    Ok(Box::new(FilteredArticlesNode::compile(env, bits, false)?))
}

/// `{% articles_app_reverse view urlconf [args...] [k=v...] [as var] %}`
pub struct AppReverseNode {
    env: Arc<TagEnvironment>,
    view_name: FilterExpression,
    urlconf: FilterExpression,
    args: Vec<FilterExpression>,
    kwargs: BTreeMap<String, FilterExpression>,
    asvar: Option<String>,
}

impl Node for AppReverseNode {
    fn render(&self, context: &mut Context) -> ArticlesResult<String> {
        let view_name = value_to_string(&self.view_name.resolve(context));
        let urlconf = self.urlconf.resolve(context);
        let urlconf_path = value_to_string(&urlconf);
        let source = match &urlconf {
            Value::Object(_) => UrlconfSource::Context(&urlconf),
            _ => UrlconfSource::Path(&urlconf_path),
        };

        let mut args = ReverseArgs::new();
        for arg in &self.args {
            args = args.arg(value_to_string(&arg.resolve(context)));
        }
        for (name, value) in &self.kwargs {
            args = args.kwarg(name.clone(), value_to_string(&value.resolve(context)));
        }
        if let Some(current_app) = context.current_app() {
            args = args.current_app(current_app);
        }

        let url = match self.env.reverser.reverse(&view_name, source, args) {
            Ok(url) => url,
            Err(err) if err.is_no_reverse_match() && self.asvar.is_some() => {
                tracing::debug!(view = %view_name, error = %err, "app reverse failed, storing empty url");
                String::new()
            }
            Err(err) => return Err(err),
        };

        match &self.asvar {
            Some(var) => {
                context.set(var.clone(), Value::String(url));
                Ok(String::new())
            }
            None => Ok(url),
        }
    }
}

pub(crate) fn compile_app_reverse(
    env: &Arc<TagEnvironment>,
    bits: &[String],
) -> ArticlesResult<Box<dyn Node>> {
    if bits.len() < 3 {
        return Err(ArticlesError::TemplateSyntaxError(format!(
            "'{}' takes at least two arguments (path to a view and a urlconf)",
            tag_name(bits)
        )));
    }
    let view_name = FilterExpression::compile(&bits[1])?;
    let urlconf = FilterExpression::compile(&bits[2])?;
    let (rest, asvar) = split_as_var(bits[3..].to_vec());

    let mut args = Vec::new();
    let mut kwargs = BTreeMap::new();
    for bit in &rest {
        let (name, value) = parse_bit(bit).map_err(|_| {
            ArticlesError::TemplateSyntaxError("Malformed arguments to app_reverse tag".to_string())
        })?;
        match name {
            Some(name) => {
                kwargs.insert(name, value);
            }
            None => args.push(value),
        }
    }

    Ok(Box::new(AppReverseNode {
        env: Arc::clone(env),
        view_name,
        urlconf,
        args,
        kwargs,
        asvar,
    }))
}
