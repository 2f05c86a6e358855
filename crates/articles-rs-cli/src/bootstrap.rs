//! Assembling an [`ArticlesApp`] from command line options.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use articles_rs_app::templatetags::TeraRenderer;
use articles_rs_app::{AppConfig, ArticlesApp, Fixture};
use articles_rs_core::logging::setup_logging;
use articles_rs_core::{settings_loader, ArticlesResult, Settings};

/// The global options every command accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppOptions {
    /// Settings file; environment overrides apply either way.
    pub settings: Option<PathBuf>,
    /// JSON fixture to load.
    pub fixture: Option<PathBuf>,
    /// Template directory layered over the built-in templates.
    pub templates: Option<PathBuf>,
}

impl AppOptions {
    /// Reads the global options from parsed arguments.
    pub fn from_matches(matches: &clap::ArgMatches) -> Self {
        let path = |id: &str| matches.get_one::<PathBuf>(id).cloned();
        Self {
            settings: path("settings"),
            fixture: path("fixture"),
            templates: path("templates"),
        }
    }
}

/// Loads settings from `path`, or from the environment alone.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub fn load_settings(path: Option<&Path>) -> ArticlesResult<Settings> {
    match path {
        Some(path) => settings_loader::from_file_with_env(path),
        None => Ok(settings_loader::from_env()),
    }
}

/// Builds a ready app: settings, logging, templates, signal hookup, then
/// the fixture.
///
/// # Errors
///
/// Fails when any of the inputs cannot be loaded.
pub fn build_app(options: &AppOptions) -> anyhow::Result<ArticlesApp> {
    let settings = load_settings(options.settings.as_deref()).with_context(|| {
        format!(
            "could not load settings from {}",
            options
                .settings
                .as_deref()
                .map_or_else(|| "the environment".to_string(), |p| p.display().to_string())
        )
    })?;
    setup_logging(&settings);

    let mut app = ArticlesApp::new(settings)?;
    if let Some(dir) = &options.templates {
        let mut renderer = TeraRenderer::new()?;
        renderer
            .add_template_dir(dir)
            .with_context(|| format!("could not load templates from {}", dir.display()))?;
        app = app.with_renderer(Arc::new(renderer));
    }
    app.ready();

    if let Some(path) = &options.fixture {
        let summary = Fixture::from_json_file(path)
            .and_then(|fixture| fixture.load_into(&app))
            .with_context(|| format!("could not load fixture {}", path.display()))?;
        tracing::debug!(?summary, "fixture ready");
    }
    Ok(app)
}
