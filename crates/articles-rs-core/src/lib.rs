//! # articles-rs-core
//!
//! Foundation types shared by every articles-rs crate. Nothing in here knows
//! about pages, articles or URL resolution.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Add-on settings with defaults
//! - [`settings_loader`] - Loading settings from TOML/JSON files and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`i18n`] - Per-thread language activation
//! - [`utils`] - Lazy text and slug helpers

pub mod error;
pub mod i18n;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{ArticlesError, ArticlesResult, ValidationError};
pub use settings::Settings;
