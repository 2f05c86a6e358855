//! Management command framework.
//!
//! [`ManagementCommand`] defines one subcommand of the `articles` binary and
//! [`CommandRegistry`] collects them into a single clap application.
//!
//! ## Defining a Custom Command
//!
//! ```rust
//! use std::io::Write;
//!
//! use articles_rs_app::ArticlesApp;
//! use articles_rs_cli::command::{CommandRegistry, ManagementCommand};
//! use articles_rs_core::ArticlesResult;
//!
//! struct CountCommand;
//!
//! impl ManagementCommand for CountCommand {
//!     fn name(&self) -> &'static str { "count" }
//!     fn help(&self) -> &'static str { "Count active articles" }
//!
//!     fn handle(
//!         &self,
//!         _matches: &clap::ArgMatches,
//!         app: &ArticlesApp,
//!         out: &mut dyn Write,
//!     ) -> ArticlesResult<()> {
//!         writeln!(out, "{}", app.articles().active().len())?;
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = CommandRegistry::new();
//! registry.register(Box::new(CountCommand));
//! let mut out = Vec::new();
//! registry.run_from(["articles", "count"], &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "0\n");
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context as _;
use articles_rs_app::ArticlesApp;
use articles_rs_core::ArticlesResult;

use crate::bootstrap::{build_app, AppOptions};

/// A subcommand of the `articles` binary.
///
/// Commands receive a fully assembled [`ArticlesApp`] with the fixture
/// already loaded, and write their results to `out`.
pub trait ManagementCommand: Send + Sync {
    /// The name the command is invoked with.
    fn name(&self) -> &'static str;

    /// A one-line description for `--help`.
    fn help(&self) -> &'static str;

    /// Adds command-specific arguments. The default adds none.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command.
    fn handle(
        &self,
        matches: &clap::ArgMatches,
        app: &ArticlesApp,
        out: &mut dyn Write,
    ) -> ArticlesResult<()>;
}

/// The registered commands, keyed by name.
pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn ManagementCommand>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.list_commands())
            .finish()
    }
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in commands.
    pub fn with_builtin_commands() -> Self {
        let mut registry = Self::new();
        crate::commands::register_builtin_commands(&mut registry);
        registry
    }

    /// Registers a command, replacing any command of the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        self.commands.insert(command.name(), command);
    }

    /// Returns the command with the given name.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Sorted command names.
    pub fn list_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the clap application: global options plus one subcommand per
    /// registered command.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("articles")
            .about("Inspect articles content and reverse application URLs")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                clap::Arg::new("settings")
                    .long("settings")
                    .short('s')
                    .global(true)
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("Settings file (.toml or .json)"),
            )
            .arg(
                clap::Arg::new("fixture")
                    .long("fixture")
                    .short('f')
                    .global(true)
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("JSON fixture with pages, bindings, categories and articles"),
            )
            .arg(
                clap::Arg::new("templates")
                    .long("templates")
                    .global(true)
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("Directory of templates overriding the built-in ones"),
            );

        for name in self.list_commands() {
            if let Some(cmd) = self.commands.get(name) {
                let subcmd = clap::Command::new(name).about(cmd.help());
                app = app.subcommand(cmd.add_arguments(subcmd));
            }
        }
        app
    }

    /// Assembles the app from the global options and dispatches to the
    /// selected subcommand.
    ///
    /// # Errors
    ///
    /// Fails when the settings, templates or fixture cannot be loaded, or
    /// when the command itself fails.
    pub fn run(&self, matches: &clap::ArgMatches, out: &mut dyn Write) -> anyhow::Result<()> {
        let (name, sub_matches) = matches
            .subcommand()
            .context("no command given")?;
        let command = self
            .get(name)
            .with_context(|| format!("unknown command '{name}'"))?;

        let app = build_app(&AppOptions::from_matches(sub_matches))?;
        tracing::debug!(command = name, "running command");
        command
            .handle(sub_matches, &app, out)
            .with_context(|| format!("'{name}' failed"))
    }

    /// Parses `args` and runs the selected command.
    ///
    /// # Errors
    ///
    /// Fails on invalid arguments and everything [`run`](Self::run) fails on.
    pub fn run_from<I, T>(&self, args: I, out: &mut dyn Write) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = self.build_cli().try_get_matches_from(args)?;
        self.run(&matches, out)
    }
}
