//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (deep-merged over the defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `ARTICLES_DEBUG` | `debug` |
//! | `ARTICLES_LOG_LEVEL` | `log_level` |
//! | `ARTICLES_LANGUAGE_CODE` | `language_code` |
//! | `ARTICLES_SITE_ID` | `site_id` |
//! | `ARTICLES_CACHE_BACKEND` | `cache.backend` |
//! | `ARTICLES_BYPASS_REVERSE_CACHE` | `articles.bypass_reverse_cache` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use articles_rs_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/articles.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::ArticlesError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Keys absent from the TOML keep their default values, including keys of
/// nested tables such as `[articles]`.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, ArticlesError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| ArticlesError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, ArticlesError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, ArticlesError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, ArticlesError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| ArticlesError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, ArticlesError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from a file, choosing the format from its extension
/// (`.json` is JSON, anything else is TOML), then applies environment
/// overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, ArticlesError> {
    let path = path.as_ref();
    let mut settings = if path.extension().is_some_and(|ext| ext == "json") {
        from_json_file(path)?
    } else {
        from_toml_file(path)?
    };
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `ARTICLES_*` environment variable overrides to a settings struct.
///
/// Unparseable numeric values are ignored and logged.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("ARTICLES_DEBUG") {
        settings.debug = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("ARTICLES_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("ARTICLES_LANGUAGE_CODE") {
        settings.language_code = val;
    }

    if let Ok(val) = std::env::var("ARTICLES_SITE_ID") {
        match val.parse::<u64>() {
            Ok(site_id) => settings.site_id = site_id,
            Err(_) => tracing::warn!(value = %val, "ignoring non-numeric ARTICLES_SITE_ID"),
        }
    }

    if let Ok(val) = std::env::var("ARTICLES_CACHE_BACKEND") {
        settings.cache.backend = val;
    }

    if let Ok(val) = std::env::var("ARTICLES_BYPASS_REVERSE_CACHE") {
        settings.articles.bypass_reverse_cache = parse_flag(&val);
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read_config(path: &Path, format: &str) -> Result<String, ArticlesError> {
    std::fs::read_to_string(path).map_err(|e| {
        ArticlesError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(
    value: serde_json::Value,
    format: &str,
) -> Result<Settings, ArticlesError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        ArticlesError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        ArticlesError::ConfigurationError(format!(
            "Failed to deserialize settings from {format}: {e}"
        ))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. Objects merge key by key; anything else is
/// replaced by `override_val`.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            language_code = "de"
            site_id = 3
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.language_code, "de");
        assert_eq!(settings.site_id, 3);
        // Defaults preserved
        assert_eq!(settings.log_level, "info");
        assert!(settings.articles.bypass_reverse_cache);
    }

    #[test]
    fn test_from_toml_str_nested_articles_table() {
        let toml = r#"
            [articles]
            bypass_reverse_cache = false
            extensions = ["author"]

            [[articles.applications]]
            urlconf = "news.urls"
            name = "News"
            urls = "articles.urls"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.articles.bypass_reverse_cache);
        assert_eq!(settings.articles.extensions, vec!["author".to_string()]);
        // Arrays replace rather than merge
        assert_eq!(settings.articles.applications.len(), 1);
        assert_eq!(
            settings.articles.applications[0].urls.as_deref(),
            Some("articles.urls")
        );
        // Sibling keys in the nested table keep their defaults
        assert_eq!(settings.articles.list_template, "articles/articles.html");
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.site_id, 1);
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("this is not = = toml");
        assert!(matches!(result, Err(ArticlesError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str("site_id = \"one\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{"log_level": "debug", "cache": {"backend": "dummy"}}"#;
        let settings = from_json_str(json).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.cache.backend, "dummy");
        assert!(settings.cache.timeout.is_none());
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{not json").is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "site_id = 7").unwrap();

        let settings = from_toml_file(file.path()).unwrap();
        assert_eq!(settings.site_id, 7);
    }

    #[test]
    fn test_from_file_picks_json_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"site_id": 9}}"#).unwrap();

        let settings = from_file_with_env(file.path()).unwrap();
        assert_eq!(settings.site_id, 9);
    }

    #[test]
    fn test_missing_file() {
        let result = from_toml_file("/nonexistent/articles.toml");
        match result {
            Err(ArticlesError::ConfigurationError(msg)) => {
                assert!(msg.contains("/nonexistent/articles.toml"));
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("YES"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
    }

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"a": {"b": 1, "c": 2}, "d": 3});
        let over = serde_json::json!({"a": {"b": 10}});
        let merged = merge_json(base, over);
        assert_eq!(merged, serde_json::json!({"a": {"b": 10, "c": 2}, "d": 3}));
    }
}
