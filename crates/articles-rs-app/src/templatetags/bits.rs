//! Tag argument parsing.
//!
//! Tags are compiled once and rendered many times. Everything in this module
//! runs at compile time and reports problems as
//! [`ArticlesError::TemplateSyntaxError`].

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use articles_rs_core::{ArticlesError, ArticlesResult};

use super::context::Context;

fn syntax_error(message: impl Into<String>) -> ArticlesError {
    ArticlesError::TemplateSyntaxError(message.into())
}

/// Splits tag contents on whitespace, keeping quoted strings together.
///
/// Surrounding `{%` / `%}` delimiters are ignored.
///
/// ```
/// use articles_rs_app::templatetags::bits::split_contents;
///
/// assert_eq!(
///     split_contents(r#"{% articles_app_reverse "article_detail" 'articles.urls' slug=a.slug %}"#),
///     vec!["articles_app_reverse", "\"article_detail\"", "'articles.urls'", "slug=a.slug"],
/// );
/// ```
pub fn split_contents(tag: &str) -> Vec<String> {
    let content = tag.trim();
    let content = content.strip_prefix("{%").unwrap_or(content);
    let content = content.strip_suffix("%}").unwrap_or(content);

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in content.chars() {
        match (quote, ch) {
            (None, '\'' | '"') => {
                quote = Some(ch);
                current.push(ch);
            }
            (Some(open), _) if ch == open => {
                quote = None;
                current.push(ch);
            }
            (None, c) if c.is_whitespace() => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// A compiled tag argument: a literal or a variable lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    /// A quoted string, number, `True`, `False` or `None`.
    Literal(Value),
    /// A dotted variable path resolved against the context.
    Variable(String),
}

fn variable_re() -> &'static Regex {
    static VARIABLE: OnceLock<Regex> = OnceLock::new();
    VARIABLE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z0-9_]+)*$").expect("static variable regex")
    })
}

impl FilterExpression {
    /// Compiles one token.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::TemplateSyntaxError`] for empty tokens,
    /// unterminated strings and invalid variable names.
    pub fn compile(token: &str) -> ArticlesResult<Self> {
        if token.is_empty() {
            return Err(syntax_error("Empty argument"));
        }

        let mut chars = token.chars();
        if let Some(open @ ('"' | '\'')) = chars.next() {
            return match token[1..].strip_suffix(open) {
                Some(inner) if token.len() >= 2 => Ok(Self::Literal(Value::String(inner.to_string()))),
                _ => Err(syntax_error(format!("Unterminated string literal {token}"))),
            };
        }

        match token {
            "True" => return Ok(Self::Literal(Value::Bool(true))),
            "False" => return Ok(Self::Literal(Value::Bool(false))),
            "None" => return Ok(Self::Literal(Value::Null)),
            _ => {}
        }

        if let Ok(int) = token.parse::<i64>() {
            return Ok(Self::Literal(Value::from(int)));
        }
        if let Ok(float) = token.parse::<f64>() {
            return Ok(Self::Literal(Value::from(float)));
        }

        if variable_re().is_match(token) {
            Ok(Self::Variable(token.to_string()))
        } else {
            Err(syntax_error(format!("Could not parse '{token}'")))
        }
    }

    /// Resolves the expression; unknown variables give `Null`.
    pub fn resolve(&self, context: &Context) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Variable(path) => context.get(path).cloned().unwrap_or(Value::Null),
        }
    }
}

/// Renders a resolved value the way it would appear in a URL.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Compiled positional and keyword arguments of a tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagArguments {
    /// Positional arguments in order.
    pub args: Vec<FilterExpression>,
    /// Keyword arguments.
    pub kwargs: BTreeMap<String, FilterExpression>,
}

fn kwarg_re() -> &'static Regex {
    static KWARG: OnceLock<Regex> = OnceLock::new();
    KWARG.get_or_init(|| Regex::new(r"^(?:(\w+)=)?(.+)$").expect("static kwarg regex"))
}

/// Splits one bit into an optional keyword and a value.
///
/// # Errors
///
/// Returns [`ArticlesError::TemplateSyntaxError`] if the bit is malformed.
pub fn parse_bit(bit: &str) -> ArticlesResult<(Option<String>, FilterExpression)> {
    let captures = kwarg_re()
        .captures(bit)
        .ok_or_else(|| syntax_error(format!("Malformed argument '{bit}'")))?;
    let name = captures.get(1).map(|m| m.as_str().to_string());
    let value = captures.get(2).map_or("", |m| m.as_str());
    Ok((name, FilterExpression::compile(value)?))
}

/// Compiles every bit after the tag name: `name=value` becomes a keyword
/// argument, anything else a positional one.
///
/// # Errors
///
/// Returns [`ArticlesError::TemplateSyntaxError`] if a bit cannot be compiled.
pub fn parse_tokens(bits: &[String]) -> ArticlesResult<TagArguments> {
    let mut parsed = TagArguments::default();
    for bit in bits.iter().skip(1) {
        match parse_bit(bit)? {
            (Some(name), value) => {
                parsed.kwargs.insert(name, value);
            }
            (None, value) => parsed.args.push(value),
        }
    }
    Ok(parsed)
}

/// Strips a trailing `as <var>` and returns the variable name.
pub fn split_as_var(mut bits: Vec<String>) -> (Vec<String>, Option<String>) {
    if bits.len() >= 2 && bits[bits.len() - 2] == "as" {
        let var = bits.pop();
        bits.pop();
        (bits, var)
    } else {
        (bits, None)
    }
}

/// Binds arguments to named parameters, positionals first.
///
/// # Errors
///
/// Returns [`ArticlesError::TemplateSyntaxError`] for too many positional
/// arguments, unknown keywords and parameters given twice.
pub fn bind_params(
    tag: &str,
    params: &[&str],
    arguments: TagArguments,
) -> ArticlesResult<BTreeMap<String, FilterExpression>> {
    if arguments.args.len() > params.len() {
        return Err(syntax_error(format!(
            "'{tag}' takes at most {} arguments, {} given",
            params.len(),
            arguments.args.len()
        )));
    }

    let mut bound: BTreeMap<String, FilterExpression> = params
        .iter()
        .zip(arguments.args)
        .map(|(name, value)| ((*name).to_string(), value))
        .collect();

    for (name, value) in arguments.kwargs {
        if !params.contains(&name.as_str()) {
            return Err(syntax_error(format!(
                "'{tag}' got an unexpected keyword argument '{name}'"
            )));
        }
        if bound.insert(name.clone(), value).is_some() {
            return Err(syntax_error(format!(
                "'{tag}' got multiple values for argument '{name}'"
            )));
        }
    }
    Ok(bound)
}
