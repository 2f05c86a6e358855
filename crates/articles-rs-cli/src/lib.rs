//! # articles-rs-cli
//!
//! The `articles` command line. Every command builds an
//! [`ArticlesApp`](articles_rs_app::ArticlesApp) from an optional settings
//! file, template directory and JSON fixture, then works on it:
//!
//! - `check` - report bindings and settings that cannot be reversed
//! - `reverse` - print the URL of a view inside a mounted application
//! - `cycle-cache` - advance the app reverse cache generation
//! - `render` - render one articles template tag
//!
//! ```rust
//! use articles_rs_cli::CommandRegistry;
//!
//! let registry = CommandRegistry::with_builtin_commands();
//! assert_eq!(
//!     registry.list_commands(),
//!     vec!["check", "cycle-cache", "render", "reverse"]
//! );
//! ```

pub mod bootstrap;
pub mod command;
pub mod commands;

pub use bootstrap::{build_app, AppOptions};
pub use command::{CommandRegistry, ManagementCommand};
