//! Core error types for articles-rs.
//!
//! [`ArticlesError`] covers URL reversal, lookups against the content stores,
//! form validation, configuration, template tags, the cache and
//! serialization. Each variant maps to an HTTP status code so views embedding
//! the add-on can turn failures into responses.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A validation error with optional field-level errors.
///
/// Used by the admin form: a simple error carries one message and a code,
/// a compound error carries per-field lists.
///
/// # Examples
///
/// ```
/// use articles_rs_core::error::ValidationError;
///
/// let err = ValidationError::new("This field is required.", "required");
/// assert_eq!(err.to_string(), "This field is required.");
///
/// let mut field_errors = std::collections::HashMap::new();
/// field_errors.insert("slug".to_string(), vec![err]);
/// let err = ValidationError::with_field_errors(field_errors);
/// assert!(err.has_field("slug"));
/// ```
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "unique").
    pub code: String,
    /// Additional parameters providing context for the message.
    pub params: HashMap<String, String>,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: HashMap::new(),
            field_errors,
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if there is at least one error recorded for `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.field_errors.get(field).is_some_and(|e| !e.is_empty())
    }

    /// Returns the codes recorded for `field`, in insertion order.
    pub fn codes_for(&self, field: &str) -> Vec<&str> {
        self.field_errors
            .get(field)
            .map(|errors| errors.iter().map(|e| e.code.as_str()).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut fields: Vec<_> = self.field_errors.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            let mut first = true;
            for (field, errors) in fields {
                for error in errors {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for articles-rs.
#[derive(Error, Debug)]
pub enum ArticlesError {
    // ── URL reversal ─────────────────────────────────────────────────

    /// No URL could be built for the requested view, either because no
    /// application content mounts the urlconf or because the router rejected
    /// the name/arguments combination.
    #[error("No reverse match: {0}")]
    NoReverseMatch(String),

    // ── Lookups ──────────────────────────────────────────────────────

    /// A lookup expected exactly one result but found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// A lookup expected exactly one result but found several.
    #[error("Multiple objects returned when one expected: {0}")]
    MultipleObjectsReturned(String),

    /// A write would violate a uniqueness or tree constraint.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The add-on is wired up incorrectly (unknown backend, bad pattern...).
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── Templates ────────────────────────────────────────────────────

    /// A template tag was invoked with malformed arguments.
    #[error("Template syntax error: {0}")]
    TemplateSyntaxError(String),

    /// Rendering a template failed.
    #[error("Template error: {0}")]
    TemplateError(String),

    // ── Cache ────────────────────────────────────────────────────────

    /// The cache backend failed to read or write.
    #[error("Cache error: {0}")]
    CacheError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ArticlesError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `ValidationError` -> 400
    /// - `DoesNotExist` -> 404
    /// - `IntegrityError` -> 409
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ValidationError(_) => 400,
            Self::DoesNotExist(_) => 404,
            Self::IntegrityError(_) => 409,
            Self::NoReverseMatch(_)
            | Self::MultipleObjectsReturned(_)
            | Self::ConfigurationError(_)
            | Self::ImproperlyConfigured(_)
            | Self::TemplateSyntaxError(_)
            | Self::TemplateError(_)
            | Self::CacheError(_)
            | Self::SerializationError(_)
            | Self::IoError(_) => 500,
        }
    }

    /// Returns `true` for [`ArticlesError::NoReverseMatch`].
    pub const fn is_no_reverse_match(&self) -> bool {
        matches!(self, Self::NoReverseMatch(_))
    }
}

impl From<ValidationError> for ArticlesError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

impl From<serde_json::Error> for ArticlesError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, ArticlesError>`.
pub type ArticlesResult<T> = Result<T, ArticlesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_simple() {
        let err = ValidationError::new("This field is required.", "required");
        assert_eq!(err.to_string(), "This field is required.");
    }

    #[test]
    fn test_validation_error_display_field_errors_sorted() {
        let mut field_errors = HashMap::new();
        field_errors.insert(
            "title".to_string(),
            vec![ValidationError::new("Required.", "required")],
        );
        field_errors.insert(
            "slug".to_string(),
            vec![ValidationError::new("Taken.", "unique")],
        );
        let err = ValidationError::with_field_errors(field_errors);
        assert_eq!(err.to_string(), "slug: Taken.; title: Required.");
        assert_eq!(err.codes_for("slug"), vec!["unique"]);
        assert!(err.codes_for("parent").is_empty());
    }

    #[test]
    fn test_validation_error_with_param() {
        let err = ValidationError::new("Too long.", "max_length").with_param("max", "255");
        assert_eq!(err.params.get("max").map(String::as_str), Some("255"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ArticlesError::NoReverseMatch("x".into()).status_code(), 500);
        assert_eq!(ArticlesError::DoesNotExist("x".into()).status_code(), 404);
        assert_eq!(ArticlesError::IntegrityError("x".into()).status_code(), 409);
        assert_eq!(
            ArticlesError::ValidationError(ValidationError::new("x", "y")).status_code(),
            400
        );
        assert_eq!(ArticlesError::TemplateSyntaxError("x".into()).status_code(), 500);
        assert_eq!(ArticlesError::CacheError("x".into()).status_code(), 500);
    }

    #[test]
    fn test_is_no_reverse_match() {
        assert!(ArticlesError::NoReverseMatch("articles.urls".into()).is_no_reverse_match());
        assert!(!ArticlesError::DoesNotExist("x".into()).is_no_reverse_match());
    }

    #[test]
    fn test_display() {
        let err = ArticlesError::NoReverseMatch("articles.urls".into());
        assert_eq!(err.to_string(), "No reverse match: articles.urls");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ArticlesError = io_err.into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let serde_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: ArticlesError = serde_err.into();
        assert!(matches!(err, ArticlesError::SerializationError(_)));
    }
}
