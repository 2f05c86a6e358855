//! Tags of the `articlecategory` library.

use std::sync::Arc;

use serde_json::Value;

use articles_rs_core::ArticlesResult;

use super::article::{tag_name, FilteredArticlesNode};
use super::bits::{bind_params, parse_tokens, FilterExpression};
use super::context::Context;
use super::library::{Node, TagEnvironment};
use crate::models::Category;
use crate::reverse::{ReverseArgs, UrlconfSource};
use crate::urls::CATEGORY_URLCONF;

/// `{% articlecategories [selected] [current] %}`
///
/// Without `current` the active root categories are listed. With `current`,
/// its active children are listed only while `selected` lies inside the
/// subtree of `current`.
pub struct CategoriesNode {
    env: Arc<TagEnvironment>,
    selected: Option<FilterExpression>,
    current: Option<FilterExpression>,
}

impl CategoriesNode {
    /// Resolves a category given either as an object with an `id` or as a
    /// bare id.
    fn resolve_category(&self, expr: Option<&FilterExpression>, context: &Context) -> Option<Category> {
        let value = expr?.resolve(context);
        let id = match &value {
            Value::Object(map) => map.get("id").and_then(Value::as_u64),
            other => other.as_u64(),
        }?;
        self.env.categories.get(id)
    }

    fn category_value(&self, category: &Category) -> ArticlesResult<Value> {
        let url = self
            .env
            .reverser
            .reverse(
                "article_category",
                UrlconfSource::Path(CATEGORY_URLCONF),
                ReverseArgs::new().kwarg("category_url", category.slug.clone()),
            )
            .ok();
        let mut value = serde_json::to_value(category)?;
        if let (Value::Object(map), Some(url)) = (&mut value, url) {
            map.insert("url".to_string(), Value::String(url));
        }
        Ok(value)
    }
}

impl Node for CategoriesNode {
    fn render(&self, context: &mut Context) -> ArticlesResult<String> {
        let selected = self.resolve_category(self.selected.as_ref(), context);
        let authenticated = context.user_is_authenticated();
        let store = &self.env.categories;

        let categories = match self.resolve_category(self.current.as_ref(), context) {
            None => Some(store.roots(authenticated)),
            Some(current) => selected
                .as_ref()
                .filter(|selected| store.is_descendant_or_self(selected.id, current.id))
                .map(|_| store.children(current.id, authenticated)),
        };

        let categories = match categories {
            Some(categories) => Value::Array(
                categories
                    .iter()
                    .map(|c| self.category_value(c))
                    .collect::<ArticlesResult<Vec<_>>>()?,
            ),
            None => Value::Null,
        };
        let selected = match selected {
            Some(selected) => serde_json::to_value(selected)?,
            None => Value::Null,
        };

        context.push();
        context.set("selected", selected);
        context.set("categories", categories);
        let output = self
            .env
            .renderer
            .render(&self.env.categories_template, context);
        context.pop();
        output
    }
}

pub(crate) fn compile_categories(
    env: &Arc<TagEnvironment>,
    bits: &[String],
) -> ArticlesResult<Box<dyn Node>> {
    let mut params = bind_params(tag_name(bits), &["selected", "current"], parse_tokens(bits)?)?;
    Ok(Box::new(CategoriesNode {
        env: Arc::clone(env),
        selected: params.remove("selected"),
        current: params.remove("current"),
    }))
}

/// Same as the `article` library's tag, restricted to articles in the
/// active language.
pub(crate) fn compile_articles_with_categoryslug(
    env: &Arc<TagEnvironment>,
    bits: &[String],
) -> ArticlesResult<Box<dyn Node>> {
    Ok(Box::new(FilteredArticlesNode::compile(env, bits, true)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templatetags::library::TagLibrary;
    use crate::templatetags::testing::environment;
    use articles_rs_core::i18n::LanguageOverride;
    use articles_rs_core::ArticlesError;
    use serde_json::json;

    fn library() -> TagLibrary {
        TagLibrary::articlecategory(environment())
    }

    #[test]
    fn test_roots_for_anonymous_user() {
        let html = library()
            .render("{% articlecategories %}", &mut Context::new())
            .unwrap();
        assert!(html.contains(r#"<a href="/topics/sport/">Sport</a>"#));
        assert!(html.contains("Politics"));
        assert!(!html.contains("Members"));
        assert!(!html.contains("Football"));
    }

    #[test]
    fn test_restricted_roots_for_authenticated_user() {
        let mut ctx = Context::from_value(json!({"request": {"user": {"is_authenticated": true}}}));
        let html = library().render("{% articlecategories %}", &mut ctx).unwrap();
        assert!(html.contains("Members"));
    }

    #[test]
    fn test_children_when_selected_inside_current() {
        let mut ctx = Context::from_value(json!({
            "selected": {"id": 2},
            "current": {"id": 1, "slug": "sport"},
        }));
        let html = library()
            .render("{% articlecategories selected current %}", &mut ctx)
            .unwrap();
        assert!(html.contains(r#"<li class="selected"><a href="/topics/football/">Football</a>"#));
        assert!(!html.contains("Politics"));
    }

    #[test]
    fn test_nothing_when_selected_outside_current() {
        let mut ctx = Context::from_value(json!({"selected": 4, "current": 1}));
        let html = library()
            .render("{% articlecategories selected current %}", &mut ctx)
            .unwrap();
        assert_eq!(html.trim(), "");
    }

    #[test]
    fn test_nothing_without_selected() {
        let mut ctx = Context::from_value(json!({"current": 1}));
        let html = library()
            .render("{% articlecategories current=current %}", &mut ctx)
            .unwrap();
        assert_eq!(html.trim(), "");
    }

    #[test]
    fn test_with_categoryslug_filters_language() {
        let _guard = LanguageOverride::new("de");
        let mut ctx = Context::new();
        library()
            .render("{% articles_with_categoryslug 'sport' as sport %}", &mut ctx)
            .unwrap();
        assert_eq!(ctx.get("sport.0.title"), Some(&json!("Beta")));
        assert_eq!(ctx.get("sport.1"), None);
    }

    #[test]
    fn test_with_categoryslug_unknown_category() {
        let err = library()
            .render("{% articles_with_categoryslug 'nope' %}", &mut Context::new())
            .unwrap_err();
        assert!(matches!(err, ArticlesError::DoesNotExist(_)));
    }
}
