//! Configuration management for quill.
//!
//! Parses `quill.toml` with serde and discovers it in the current
//! directory or its parents. A missing file means defaults.
//!
//! ```toml
//! [highlight]
//! enabled = true
//! theme = "${QUILL_THEME:-InspiredGitHub}"
//!
//! [math]
//! enabled = true
//!
//! [render]
//! gfm = true
//! toc_max_level = 3
//! placeholder_prefix = "__QUILL_CODE_"
//! ```
//!
//! CLI settings are applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! `highlight.theme` supports `${VAR}` (error if unset) and
//! `${VAR:-default}`.

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quill.toml";

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override highlighting theme.
    pub theme: Option<String>,
    /// Override highlighting enabled flag.
    pub highlight_enabled: Option<bool>,
    /// Override math enabled flag.
    pub math_enabled: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Syntax highlighting.
    pub highlight: HighlightConfig,
    /// Math typesetting.
    pub math: MathConfig,
    /// Markdown rendering.
    pub render: RenderConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Syntax highlighting configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Whether code blocks are highlighted.
    pub enabled: bool,
    /// Highlighting theme name.
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            theme: "InspiredGitHub".to_owned(),
        }
    }
}

/// Math configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MathConfig {
    /// Whether `$...$` and `$$...$$` are typeset.
    pub enabled: bool,
}

impl Default for MathConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Markdown rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// GFM tables, strikethrough and task lists.
    pub gfm: bool,
    /// Deepest heading level included in the table of contents.
    pub toc_max_level: u8,
    /// Prefix of internal code block placeholders.
    pub placeholder_prefix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            gfm: true,
            toc_max_level: 3,
            placeholder_prefix: "__QUILL_CODE_".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`highlight.theme`").
        field: String,
        /// Error message (e.g., "${`QUILL_THEME`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quill.toml` in current directory and parents.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if reading,
    /// parsing, expansion or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(theme) = &settings.theme {
            self.highlight.theme.clone_from(theme);
        }
        if let Some(enabled) = settings.highlight_enabled {
            self.highlight.enabled = enabled;
        }
        if let Some(enabled) = settings.math_enabled {
            self.math.enabled = enabled;
        }
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse, expand and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.highlight.theme, "highlight.theme")?;

        if !(1..=6).contains(&self.render.toc_max_level) {
            return Err(ConfigError::Validation(
                "render.toc_max_level must be between 1 and 6".to_owned(),
            ));
        }

        let prefix = &self.render.placeholder_prefix;
        require_non_empty(prefix, "render.placeholder_prefix")?;
        if prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(
                "render.placeholder_prefix cannot contain whitespace".to_owned(),
            ));
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.highlight.theme = expand::expand_env(&self.highlight.theme, "highlight.theme")?;
        Ok(())
    }
}
