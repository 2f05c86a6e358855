//! URL path pattern parsing, matching and building.
//!
//! [`URLPattern`] is created with either [`path`] (`articles/<int:year>/`
//! syntax) or [`re_path`] (a raw regex with named groups). Besides matching
//! incoming paths, a pattern knows how to rebuild a path from arguments,
//! which is what reversing relies on.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;

use regex::Regex;

use articles_rs_core::{ArticlesError, ArticlesResult};

use super::converters::Converter;

/// One piece of a reversible route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text emitted verbatim.
    Literal(String),
    /// A named parameter, filled from keyword arguments first and then from
    /// the next positional argument.
    Named {
        /// Parameter name.
        name: String,
        /// Converter for `path()` parameters; `None` for regex groups.
        converter: Option<Converter>,
    },
    /// An unnamed regex group, filled from the next positional argument.
    Positional,
}

/// Named and positional values captured while matching a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    /// Values of named parameters.
    pub kwargs: HashMap<String, String>,
    /// Values of unnamed groups, in order.
    pub args: Vec<String>,
}

/// A single URL pattern.
pub struct URLPattern {
    /// The original route string (e.g., `"articles/<int:year>/"`)
    route: String,
    /// The compiled regex used for matching
    regex: Regex,
    /// An optional name for reverse URL lookup
    name: Option<String>,
    /// How to rebuild the path; `None` when the regex cannot be reversed
    segments: Option<Vec<Segment>>,
}

impl fmt::Debug for URLPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("URLPattern")
            .field("route", &self.route)
            .field("regex", &self.regex.as_str())
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl URLPattern {
    /// Returns the original route string.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Returns the compiled regex pattern.
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the optional name for this pattern.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the reversible segments, or `None` if the pattern uses regex
    /// constructs outside of groups.
    pub fn segments(&self) -> Option<&[Segment]> {
        self.segments.as_deref()
    }

    fn converter_for(&self, name: &str) -> Option<Converter> {
        self.segments.as_ref()?.iter().find_map(|segment| match segment {
            Segment::Named {
                name: n,
                converter,
            } if n == name => *converter,
            _ => None,
        })
    }

    /// Attempts to match the start of `path` against this pattern.
    ///
    /// Returns the captured values and the unmatched remainder, or `None` if
    /// the path does not match or a converter rejects a captured value.
    pub fn match_path(&self, path: &str) -> Option<(Captures, String)> {
        let captures = self.regex.captures(path)?;
        let full_match = captures.get(0)?;

        let mut result = Captures::default();
        for (index, group_name) in self.regex.capture_names().enumerate().skip(1) {
            let Some(m) = captures.get(index) else {
                continue;
            };
            match group_name {
                Some(group_name) => {
                    if let Some(conv) = self.converter_for(group_name) {
                        if !conv.accepts(m.as_str()) {
                            return None;
                        }
                    }
                    result
                        .kwargs
                        .insert(group_name.to_string(), m.as_str().to_string());
                }
                None => result.args.push(m.as_str().to_string()),
            }
        }

        Some((result, path[full_match.end()..].to_string()))
    }

    /// Attempts a full match of the path (no remaining portion allowed).
    pub fn full_match(&self, path: &str) -> Option<Captures> {
        let (captures, remaining) = self.match_path(path)?;
        remaining.is_empty().then_some(captures)
    }

    /// Rebuilds this pattern's piece of a URL.
    ///
    /// Named parameters are taken from `kwargs`, falling back to positional
    /// `args` starting at `*cursor`; positional groups always consume `args`.
    /// The result must match this pattern exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::NoReverseMatch`] if a value is missing, the
    /// pattern is not reversible, or the rebuilt piece does not match.
    pub fn build(
        &self,
        args: &[String],
        cursor: &mut usize,
        kwargs: &HashMap<String, String>,
    ) -> ArticlesResult<String> {
        let segments = self.segments.as_ref().ok_or_else(|| {
            ArticlesError::NoReverseMatch(format!(
                "Pattern '{}' cannot be reversed",
                self.route
            ))
        })?;

        let mut piece = String::new();
        for segment in segments {
            match segment {
                Segment::Literal(text) => piece.push_str(text),
                Segment::Named { name, .. } => {
                    if let Some(value) = kwargs.get(name) {
                        piece.push_str(value);
                    } else if let Some(value) = args.get(*cursor) {
                        piece.push_str(value);
                        *cursor += 1;
                    } else {
                        return Err(ArticlesError::NoReverseMatch(format!(
                            "No value provided for parameter '{name}' in pattern '{}'",
                            self.route
                        )));
                    }
                }
                Segment::Positional => {
                    let value = args.get(*cursor).ok_or_else(|| {
                        ArticlesError::NoReverseMatch(format!(
                            "Missing positional argument for pattern '{}'",
                            self.route
                        ))
                    })?;
                    piece.push_str(value);
                    *cursor += 1;
                }
            }
        }

        match self.match_path(&piece) {
            Some((_, remaining)) if remaining.is_empty() => Ok(piece),
            _ => Err(ArticlesError::NoReverseMatch(format!(
                "'{piece}' does not match pattern '{}'",
                self.route
            ))),
        }
    }
}

/// Parses the `<type:name>` portion of a route, defaulting to `str`.
fn parse_type_and_name(inner: &str) -> (&str, &str) {
    inner
        .find(':')
        .map_or(("str", inner), |pos| (&inner[..pos], &inner[pos + 1..]))
}

/// Parses a `path()` route into a regex and its segments.
fn parse_route(route: &str, anchor_end: bool) -> ArticlesResult<(Regex, Vec<Segment>)> {
    let mut regex_str = String::from("^");
    let mut segments = Vec::new();
    let mut remaining = route;

    while !remaining.is_empty() {
        if let Some(start) = remaining.find('<') {
            let literal = &remaining[..start];
            regex_str.push_str(&regex::escape(literal));
            if !literal.is_empty() {
                segments.push(Segment::Literal(literal.to_string()));
            }

            let end = remaining[start..].find('>').ok_or_else(|| {
                ArticlesError::ImproperlyConfigured(format!(
                    "Unclosed angle bracket in route: {route}"
                ))
            })? + start;

            let (type_name, param_name) = parse_type_and_name(&remaining[start + 1..end]);
            let converter = Converter::from_name(type_name)?;
            write!(regex_str, "(?P<{param_name}>{})", converter.regex()).ok();
            segments.push(Segment::Named {
                name: param_name.to_string(),
                converter: Some(converter),
            });

            remaining = &remaining[end + 1..];
        } else {
            regex_str.push_str(&regex::escape(remaining));
            segments.push(Segment::Literal(remaining.to_string()));
            break;
        }
    }

    if anchor_end {
        regex_str.push('$');
    }
    let regex = Regex::new(&regex_str)
        .map_err(|e| ArticlesError::ImproperlyConfigured(format!("Invalid pattern regex: {e}")))?;
    Ok((regex, segments))
}

/// Returns the index of the `)` closing the group opened at `open`.
fn closing_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_class = false;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Derives reversible segments from a regex route, or `None` if the regex
/// uses metacharacters outside of capturing groups.
fn parse_regex_segments(regex_str: &str) -> Option<Vec<Segment>> {
    let body = regex_str.strip_prefix('^').unwrap_or(regex_str);
    let body = match body.strip_suffix('$') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => body,
    };

    let chars: Vec<char> = body.chars().collect();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                literal.push(*chars.get(i + 1)?);
                i += 2;
            }
            '(' => {
                let close = closing_paren(&chars, i)?;
                let inner: String = chars[i + 1..close].iter().collect();
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                if let Some(rest) = inner.strip_prefix("?P<") {
                    let name = &rest[..rest.find('>')?];
                    segments.push(Segment::Named {
                        name: name.to_string(),
                        converter: None,
                    });
                } else if inner.starts_with('?') {
                    return None;
                } else {
                    segments.push(Segment::Positional);
                }
                i = close + 1;
            }
            '[' | ']' | '.' | '*' | '+' | '?' | '|' | '{' | '}' | '^' | '$' => return None,
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Some(segments)
}

/// Creates a URL pattern using `path()` syntax.
///
/// The route may contain `<type:name>` placeholders; see
/// [`converters`](super::converters) for the supported types.
///
/// ```
/// use articles_rs_urls::pattern::path;
///
/// let pattern = path("<slug:category_url>/", Some("article_category")).unwrap();
/// assert_eq!(pattern.name(), Some("article_category"));
/// assert!(pattern.full_match("news/").is_some());
/// ```
///
/// # Errors
///
/// Returns an error if the route contains unknown converter types or invalid syntax.
pub fn path(route: &str, name: Option<&str>) -> ArticlesResult<URLPattern> {
    let (regex, segments) = parse_route(route, true)?;
    Ok(URLPattern {
        route: route.to_string(),
        regex,
        name: name.map(String::from),
        segments: Some(segments),
    })
}

/// Creates a URL pattern from a raw regex.
///
/// Named groups become keyword parameters, unnamed groups positional ones.
/// The regex is anchored at both ends if it is not already.
///
/// # Errors
///
/// Returns an error if the regex is invalid.
pub fn re_path(regex_str: &str, name: Option<&str>) -> ArticlesResult<URLPattern> {
    let mut full_regex = if regex_str.starts_with('^') {
        regex_str.to_string()
    } else {
        format!("^{regex_str}")
    };
    if !full_regex.ends_with('$') {
        full_regex.push('$');
    }

    let regex = Regex::new(&full_regex)
        .map_err(|e| ArticlesError::ImproperlyConfigured(format!("Invalid regex pattern: {e}")))?;

    Ok(URLPattern {
        route: regex_str.to_string(),
        regex,
        name: name.map(String::from),
        segments: parse_regex_segments(regex_str),
    })
}

/// Creates a pattern that matches a prefix of the path, used by resolvers.
///
/// # Errors
///
/// Returns an error if the route contains unknown converter types or invalid syntax.
pub fn path_prefix(route: &str) -> ArticlesResult<URLPattern> {
    let (regex, segments) = parse_route(route, false)?;
    Ok(URLPattern {
        route: route.to_string(),
        regex,
        name: None,
        segments: Some(segments),
    })
}
