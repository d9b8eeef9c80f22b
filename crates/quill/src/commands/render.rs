//! `quill render` command implementation.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use quill_config::{CliSettings, Config};
use quill_renderer::{HighlightService, MathService, Pipeline, Services};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render (default: stdin, also with `-`).
    file: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover quill.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print `{"html": ..., "toc": [...]}` instead of HTML.
    #[arg(long)]
    json: bool,

    /// Highlighting theme (overrides config).
    #[arg(long, env = "QUILL_THEME")]
    theme: Option<String>,

    /// Disable syntax highlighting.
    #[arg(long)]
    no_highlight: bool,

    /// Disable math typesetting.
    #[arg(long)]
    no_math: bool,

    /// Enable verbose output (module loading and render logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the input cannot be read or
    /// the output cannot be written.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        tracing::debug!(path = ?config.config_path, theme = %config.highlight.theme, "Loaded configuration");
        let markdown = read_input(self.file.as_deref())?;

        let pipeline = build_pipeline(&config);
        let result = pipeline.render(&markdown).await;

        let services = pipeline.services();
        if config.highlight.enabled && services.highlight.load().await.is_none() {
            output.warning("Syntax highlighting unavailable, code blocks rendered plain");
        }
        if config.math.enabled && services.math.load().await.is_none() {
            output.warning("Math engine unavailable, formulas left as source");
        }

        if self.json {
            output.document(&serde_json::to_string_pretty(&result)?)?;
        } else {
            output.document(&result.html)?;
        }
        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            theme: self.theme.clone(),
            highlight_enabled: self.no_highlight.then_some(false),
            math_enabled: self.no_math.then_some(false),
        }
    }
}

/// Build services and pipeline from configuration.
fn build_pipeline(config: &Config) -> Pipeline {
    let highlight = if config.highlight.enabled {
        HighlightService::syntect()
    } else {
        HighlightService::unavailable("syntect")
    };
    let math = if config.math.enabled {
        MathService::katex()
    } else {
        MathService::unavailable("katex")
    };

    Pipeline::new(Arc::new(Services::new(highlight, math)))
        .with_theme(config.highlight.theme.clone())
        .with_placeholder_prefix(config.render.placeholder_prefix.clone())
        .with_toc_max_level(config.render.toc_max_level)
        .with_gfm(config.render.gfm)
}

/// Read markdown from a file, or stdin for `None` and `-`.
fn read_input(file: Option<&Path>) -> Result<String, CliError> {
    match file {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut markdown = String::new();
            std::io::stdin().read_to_string(&mut markdown)?;
            Ok(markdown)
        }
    }
}
