//! Per-thread language activation.
//!
//! The active language is part of every reverse cache key and drives the
//! locale preference when several pages mount the same application.
//!
//! ```
//! use articles_rs_core::i18n;
//!
//! i18n::activate("de-at");
//! assert_eq!(i18n::get_language(), "de-at");
//! assert_eq!(i18n::short_language_code(&i18n::get_language()), "de");
//! i18n::deactivate();
//! assert_eq!(i18n::get_language(), "en");
//! ```

use std::cell::RefCell;

/// Language returned by [`get_language`] when nothing has been activated.
pub const DEFAULT_LANGUAGE: &str = "en";

thread_local! {
    static CURRENT_LANGUAGE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Activates the given language code for the current thread.
pub fn activate(language_code: &str) {
    CURRENT_LANGUAGE.with(|cell| {
        *cell.borrow_mut() = Some(language_code.to_string());
    });
}

/// Deactivates the current thread's language, reverting to [`DEFAULT_LANGUAGE`].
pub fn deactivate() {
    CURRENT_LANGUAGE.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

/// Returns the language code active on the current thread.
pub fn get_language() -> String {
    CURRENT_LANGUAGE.with(|cell| {
        cell.borrow()
            .clone()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    })
}

/// Strips the region from a language code: `"en-us"` becomes `"en"`.
///
/// Both `-` and `_` separators are accepted and the result is lowercased, so
/// `"pt_BR"` and `"PT-br"` both shorten to `"pt"`.
pub fn short_language_code(code: &str) -> String {
    code.split(['-', '_'])
        .next()
        .unwrap_or(code)
        .to_ascii_lowercase()
}

/// Returns `true` if both codes name the same language once regions are
/// stripped. Empty codes never match.
pub fn same_language(a: &str, b: &str) -> bool {
    let a = short_language_code(a);
    !a.is_empty() && a == short_language_code(b)
}

/// Activates a language for the lifetime of the guard and restores the
/// previous one on drop.
///
/// ```
/// use articles_rs_core::i18n::{self, LanguageOverride};
///
/// i18n::activate("fr");
/// {
///     let _guard = LanguageOverride::new("it");
///     assert_eq!(i18n::get_language(), "it");
/// }
/// assert_eq!(i18n::get_language(), "fr");
/// i18n::deactivate();
/// ```
#[derive(Debug)]
pub struct LanguageOverride {
    previous: Option<String>,
}

impl LanguageOverride {
    /// Activates `language_code` until the guard is dropped.
    pub fn new(language_code: &str) -> Self {
        let previous = CURRENT_LANGUAGE.with(|cell| cell.borrow().clone());
        activate(language_code);
        Self { previous }
    }
}

impl Drop for LanguageOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(code) => activate(&code),
            None => deactivate(),
        }
    }
}
