//! Template context for the article tags.
//!
//! Values are plain [`serde_json::Value`]s so that the same context can be
//! handed to the template renderer unchanged.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// A stack of variable scopes.
///
/// # Examples
///
/// ```
/// use articles_rs_app::templatetags::Context;
/// use serde_json::json;
///
/// let mut ctx = Context::new();
/// ctx.set("page", json!({"slug": "news"}));
/// assert_eq!(ctx.get("page.slug"), Some(&json!("news")));
///
/// ctx.push();
/// ctx.set("page", json!(null));
/// assert_eq!(ctx.get("page.slug"), None);
/// ctx.pop();
/// assert_eq!(ctx.get("page.slug"), Some(&json!("news")));
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    stack: Vec<HashMap<String, Value>>,
    current_app: Option<String>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a context with a single empty scope.
    pub fn new() -> Self {
        Self {
            stack: vec![HashMap::new()],
            current_app: None,
        }
    }

    /// Creates a context whose first scope holds the entries of a JSON object.
    /// Non-object values give an empty context.
    pub fn from_value(value: Value) -> Self {
        let mut context = Self::new();
        if let Value::Object(map) = value {
            for (key, value) in map {
                context.set(key, value);
            }
        }
        context
    }

    /// Sets the instance namespace passed to URL reversal.
    #[must_use]
    pub fn with_current_app(mut self, current_app: impl Into<String>) -> Self {
        self.current_app = Some(current_app.into());
        self
    }

    /// The instance namespace passed to URL reversal.
    pub fn current_app(&self) -> Option<&str> {
        self.current_app.as_deref()
    }

    /// Pushes a new scope.
    pub fn push(&mut self) {
        self.stack.push(HashMap::new());
    }

    /// Pops the top scope. The last scope is never removed.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Sets a variable in the top scope.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        if let Some(top) = self.stack.last_mut() {
            top.insert(key.into(), value);
        }
    }

    /// Looks up a dotted path such as `request.user.is_authenticated` or
    /// `articles.0.title`, searching scopes from the top down.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let root = parts.next()?;
        let mut value = self.stack.iter().rev().find_map(|scope| scope.get(root))?;
        for part in parts {
            value = match value {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(value)
    }

    /// Returns `true` if `request.user.is_authenticated` is `true`.
    pub fn user_is_authenticated(&self) -> bool {
        self.get("request.user.is_authenticated")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Merges all scopes into one object, upper scopes winning.
    pub fn flatten(&self) -> Value {
        let mut merged = Map::new();
        for scope in &self.stack {
            for (key, value) in scope {
                merged.insert(key.clone(), value.clone());
            }
        }
        Value::Object(merged)
    }
}
