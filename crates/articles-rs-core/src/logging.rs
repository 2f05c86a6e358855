//! Logging integration for articles-rs.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating spans around a
//! URL reversal.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level`. In debug mode a pretty,
/// human-readable format is used; otherwise structured JSON. Events go to
/// stderr so that command output on stdout stays clean.
///
/// Installing a second subscriber is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one application URL reversal.
///
/// # Examples
///
/// ```
/// use articles_rs_core::logging::reverse_span;
///
/// let span = reverse_span("article_detail", "articles.urls");
/// let _guard = span.enter();
/// tracing::debug!("resolving");
/// ```
pub fn reverse_span(view_name: &str, urlconf: &str) -> tracing::Span {
    tracing::debug_span!("app_reverse", view = view_name, urlconf = urlconf)
}
