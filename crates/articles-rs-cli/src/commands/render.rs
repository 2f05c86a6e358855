//! The `render` command: renders one template tag against the loaded
//! content, which is handy for checking template overrides.

use std::io::Write;

use articles_rs_app::templatetags::Context;
use articles_rs_app::ArticlesApp;
use articles_rs_core::ArticlesResult;
use serde_json::json;

use crate::command::ManagementCommand;

/// Renders a tag from the `article` or `articlecategory` library.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderCommand;

impl ManagementCommand for RenderCommand {
    fn name(&self) -> &'static str {
        "render"
    }

    fn help(&self) -> &'static str {
        "Render an articles template tag"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("tag")
                .required(true)
                .help("Tag source, e.g. \"{% articles limit=3 %}\""),
        )
        .arg(
            clap::Arg::new("library")
                .long("library")
                .value_parser(["article", "articlecategory"])
                .default_value("article")
                .help("Tag library to load"),
        )
        .arg(
            clap::Arg::new("authenticated")
                .long("authenticated")
                .action(clap::ArgAction::SetTrue)
                .help("Render as a signed-in user"),
        )
        .arg(
            clap::Arg::new("language")
                .long("language")
                .short('l')
                .help("Language to render in; defaults to the configured language"),
        )
    }

    fn handle(
        &self,
        matches: &clap::ArgMatches,
        app: &ArticlesApp,
        out: &mut dyn Write,
    ) -> ArticlesResult<()> {
        let source = matches.get_one::<String>("tag").map_or("", String::as_str);
        let library = match matches.get_one::<String>("library").map(String::as_str) {
            Some("articlecategory") => app.category_tags(),
            _ => app.article_tags(),
        };

        let language = matches
            .get_one::<String>("language")
            .cloned()
            .unwrap_or_else(|| app.settings().language_code.clone());
        let _language = articles_rs_core::i18n::LanguageOverride::new(&language);

        let mut context = Context::from_value(json!({
            "request": {"user": {"is_authenticated": matches.get_flag("authenticated")}}
        }));
        let rendered = library.render(source, &mut context)?;
        write!(out, "{rendered}")?;
        Ok(())
    }
}
