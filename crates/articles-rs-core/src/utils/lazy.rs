//! Deferred, fallible text.
//!
//! [`LazyText`] holds a closure that produces a string. Nothing runs until
//! the text is needed, and every coercion runs the closure again, so the text
//! always reflects the state at the moment it is read.

use std::fmt;

use crate::error::ArticlesResult;

type TextFactory = Box<dyn Fn() -> ArticlesResult<String> + Send + Sync>;

/// Text whose computation is deferred until it is coerced to a string.
///
/// Use [`force`](LazyText::force) to observe failures. The [`fmt::Display`]
/// impl renders an empty string when evaluation fails, after logging the
/// error, because `Display` has no way to carry it.
///
/// # Examples
///
/// ```
/// use articles_rs_core::utils::LazyText;
///
/// let lazy = LazyText::new(|| Ok("/news/".to_string()));
/// assert_eq!(lazy.force().unwrap(), "/news/");
/// assert_eq!(lazy.to_string(), "/news/");
/// ```
pub struct LazyText {
    factory: TextFactory,
}

impl fmt::Debug for LazyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyText").finish_non_exhaustive()
    }
}

impl LazyText {
    /// Creates a new `LazyText`; the factory is not called yet.
    pub fn new(factory: impl Fn() -> ArticlesResult<String> + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
        }
    }

    /// Evaluates the text now.
    pub fn force(&self) -> ArticlesResult<String> {
        (self.factory)()
    }
}

impl fmt::Display for LazyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.force() {
            Ok(value) => f.write_str(&value),
            Err(err) => {
                tracing::warn!(error = %err, "lazy text evaluation failed");
                Ok(())
            }
        }
    }
}
