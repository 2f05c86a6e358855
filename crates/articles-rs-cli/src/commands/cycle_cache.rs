//! The `cycle-cache` command.

use std::io::Write;

use articles_rs_app::ArticlesApp;
use articles_rs_cache::cycle_app_reverse_cache;
use articles_rs_core::ArticlesResult;

use crate::command::ManagementCommand;

/// Invalidates every app reverse cache entry by advancing the generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleCacheCommand;

impl ManagementCommand for CycleCacheCommand {
    fn name(&self) -> &'static str {
        "cycle-cache"
    }

    fn help(&self) -> &'static str {
        "Invalidate the app reverse cache"
    }

    fn handle(
        &self,
        _matches: &clap::ArgMatches,
        app: &ArticlesApp,
        out: &mut dyn Write,
    ) -> ArticlesResult<()> {
        let before = app.generation().current()?;
        cycle_app_reverse_cache(app.generation().as_ref());
        match (before, app.generation().current()?) {
            (Some(before), Some(after)) => {
                writeln!(out, "App reverse cache generation {before} -> {after}")?;
            }
            (None, Some(after)) => writeln!(out, "App reverse cache generation set to {after}")?,
            (_, None) => writeln!(
                out,
                "The {} cache backend keeps no generation; nothing to cycle",
                app.settings().cache.backend
            )?,
        }
        Ok(())
    }
}
