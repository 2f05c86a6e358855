//! The `check` command.
//!
//! Reports content that cannot be reversed as configured: bindings to
//! unknown urlconfs, bindings on unpublished pages, application overrides
//! pointing nowhere and articles whose URL does not resolve back to them.

use std::io::Write;

use articles_rs_app::ArticlesApp;
use articles_rs_core::{ArticlesError, ArticlesResult};

use crate::command::ManagementCommand;

/// Runs the app's system checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckCommand;

impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Check bindings, application settings and article URLs"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("strict")
                .long("strict")
                .action(clap::ArgAction::SetTrue)
                .help("Exit with an error when any issue is found"),
        )
    }

    fn handle(
        &self,
        matches: &clap::ArgMatches,
        app: &ArticlesApp,
        out: &mut dyn Write,
    ) -> ArticlesResult<()> {
        let problems = app.check();
        if problems.is_empty() {
            writeln!(out, "System check identified no issues.")?;
            return Ok(());
        }

        for problem in &problems {
            writeln!(out, "WARNING: {problem}")?;
        }
        writeln!(out, "System check identified {} issue(s).", problems.len())?;

        if matches.get_flag("strict") {
            return Err(ArticlesError::ConfigurationError(format!(
                "System check found {} issue(s)",
                problems.len()
            )));
        }
        Ok(())
    }
}
