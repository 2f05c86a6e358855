//! Path converters for `<type:name>` route parameters.
//!
//! | Name   | Regex                                  |
//! |--------|----------------------------------------|
//! | `int`  | `[0-9]+`                               |
//! | `str`  | `[^/]+`                                |
//! | `slug` | `[-a-zA-Z0-9_]+`                       |
//! | `uuid` | `[0-9a-f]{8}-...-[0-9a-f]{12}`         |
//! | `path` | `.+`                                   |

use std::fmt;

use articles_rs_core::{ArticlesError, ArticlesResult};

/// A built-in route parameter converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// One or more digits that fit in an `i64`.
    Int,
    /// Any non-empty string without `/`.
    Str,
    /// ASCII letters, digits, hyphens and underscores.
    Slug,
    /// A lowercase hyphenated UUID.
    Uuid,
    /// Any non-empty string, slashes included.
    Path,
}

impl Converter {
    /// Looks a converter up by the name used in route strings.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::ImproperlyConfigured`] for unknown names.
    pub fn from_name(name: &str) -> ArticlesResult<Self> {
        match name {
            "int" => Ok(Self::Int),
            "str" => Ok(Self::Str),
            "slug" => Ok(Self::Slug),
            "uuid" => Ok(Self::Uuid),
            "path" => Ok(Self::Path),
            other => Err(ArticlesError::ImproperlyConfigured(format!(
                "Unknown path converter: '{other}'"
            ))),
        }
    }

    /// Returns the regex fragment matched by this converter.
    pub const fn regex(self) -> &'static str {
        match self {
            Self::Int => "[0-9]+",
            Self::Str => "[^/]+",
            Self::Slug => "[-a-zA-Z0-9_]+",
            Self::Uuid => "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
            Self::Path => ".+",
        }
    }

    /// Returns `true` if `value` is acceptable for this converter beyond
    /// matching its regex (e.g. integers must not overflow).
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::Int => value.parse::<i64>().is_ok(),
            Self::Uuid => uuid::Uuid::parse_str(value).is_ok(),
            Self::Str | Self::Slug | Self::Path => !value.is_empty(),
        }
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Str => "str",
            Self::Slug => "slug",
            Self::Uuid => "uuid",
            Self::Path => "path",
        };
        f.write_str(name)
    }
}
