//! The `reverse` command: prints the URL of a view inside a mounted
//! application.

use std::io::Write;

use articles_rs_app::{ArticlesApp, ReverseArgs, UrlconfSource};
use articles_rs_core::i18n::LanguageOverride;
use articles_rs_core::ArticlesResult;

use crate::command::ManagementCommand;

/// Reverses a view name within a urlconf.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseCommand;

fn parse_kwarg(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

impl ManagementCommand for ReverseCommand {
    fn name(&self) -> &'static str {
        "reverse"
    }

    fn help(&self) -> &'static str {
        "Reverse a view inside the application mounted for a urlconf"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("view")
                .required(true)
                .help("View name, e.g. article_detail"),
        )
        .arg(
            clap::Arg::new("urlconf")
                .required(true)
                .help("Urlconf identifier, e.g. articles.urls"),
        )
        .arg(
            clap::Arg::new("arg")
                .long("arg")
                .action(clap::ArgAction::Append)
                .help("Positional URL argument (repeatable)"),
        )
        .arg(
            clap::Arg::new("kwarg")
                .long("kwarg")
                .short('k')
                .action(clap::ArgAction::Append)
                .value_parser(parse_kwarg)
                .help("Named URL argument as NAME=VALUE (repeatable)"),
        )
        .arg(
            clap::Arg::new("page-slug")
                .long("page-slug")
                .help("Only consider pages with this slug"),
        )
        .arg(
            clap::Arg::new("language")
                .long("language")
                .short('l')
                .help("Language to reverse in; defaults to the configured language"),
        )
        .arg(
            clap::Arg::new("current-app")
                .long("current-app")
                .help("Instance namespace hint"),
        )
    }

    fn handle(
        &self,
        matches: &clap::ArgMatches,
        app: &ArticlesApp,
        out: &mut dyn Write,
    ) -> ArticlesResult<()> {
        let view = matches.get_one::<String>("view").map_or("", String::as_str);
        let urlconf = matches.get_one::<String>("urlconf").map_or("", String::as_str);

        let mut args = ReverseArgs::new();
        for value in matches.get_many::<String>("arg").into_iter().flatten() {
            args = args.arg(value);
        }
        for (name, value) in matches
            .get_many::<(String, String)>("kwarg")
            .into_iter()
            .flatten()
        {
            args = args.kwarg(name, value);
        }
        if let Some(slug) = matches.get_one::<String>("page-slug") {
            args = args.page_slug(slug);
        }
        if let Some(current_app) = matches.get_one::<String>("current-app") {
            args = args.current_app(current_app);
        }

        let language = matches
            .get_one::<String>("language")
            .cloned()
            .unwrap_or_else(|| app.settings().language_code.clone());
        let _language = LanguageOverride::new(&language);

        let url = app
            .reverser()
            .reverse(view, UrlconfSource::Path(urlconf), args)?;
        writeln!(out, "{url}")?;
        Ok(())
    }
}
