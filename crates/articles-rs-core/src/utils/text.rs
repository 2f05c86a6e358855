//! Slug helpers.

use std::sync::OnceLock;

use regex::Regex;

fn slug_re() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("static slug regex"))
}

/// Converts a string to a URL-friendly slug.
///
/// Lowercases, drops characters other than word characters, whitespace and
/// hyphens, then collapses runs of whitespace/hyphens into one hyphen.
///
/// ```
/// use articles_rs_core::utils::text::slugify;
///
/// assert_eq!(slugify("Hello World!"), "hello-world");
/// assert_eq!(slugify("  Spaced  Out  "), "spaced-out");
/// ```
pub fn slugify(s: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    static MULTI_HYPHEN: OnceLock<Regex> = OnceLock::new();

    let non_alnum = NON_ALNUM.get_or_init(|| Regex::new(r"[^\w\s-]").expect("static regex"));
    let multi_hyphen = MULTI_HYPHEN.get_or_init(|| Regex::new(r"[-\s]+").expect("static regex"));

    let s = s.to_lowercase();
    let s = non_alnum.replace_all(&s, "");
    let s = multi_hyphen.replace_all(&s, "-");
    s.trim_matches(|c: char| c == '-' || c == '_').to_string()
}

/// Returns `true` if `s` is a non-empty slug (ASCII letters, digits, `-`, `_`).
pub fn is_valid_slug(s: &str) -> bool {
    slug_re().is_match(s)
}
