//! Configuration file structure for `.notebook-mdx.toml`
//!
//! Configuration files can be placed in:
//! - User home directory: `~/.notebook-mdx.toml` (user defaults)
//! - Project directory: `./.notebook-mdx.toml` (project defaults)
//! - Custom location via `--config` (overrides both)
//!
//! Precedence order (highest to lowest):
//! 1. Command-line arguments
//! 2. `--config` file
//! 3. Project config
//! 4. User config
//! 5. Built-in defaults

use anyhow::{Context, Result};
use colored::Colorize;
use notebook_mdx_core::RenderOptions;
use notebook_mdx_directive::{DirectiveOptions, EmitMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of user and project configuration files
pub const CONFIG_FILE_NAME: &str = ".notebook-mdx.toml";

/// Template written by `config init`
pub const DEFAULT_CONFIG: &str = r#"# notebook-mdx configuration file

# Defaults for the render command (and for pre-rendered directives)
[render]
# Output format: html, page, or json
# format = "html"

# Hide code inputs, show outputs only
# hide_code = false

# show_outputs = true
# show_cell_numbers = true
# show_language_indicators = true

# Embed charts interactively (false renders a static view)
# interactive = true

# show_copy_button = false
# show_line_numbers = false

# Defaults for the directive command
[directive]
# Directory notebook paths are resolved against
# (default: directory of the MDX file, else the working directory)
# base_dir = "docs"

# Component emitted for each directive
# component_name = "NotebookLoader"

# Emit mode: component or html
# emit = "component"
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Default settings for the render command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderConfig>,

    /// Default settings for the directive command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive: Option<DirectiveConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ConfigFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_code: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_outputs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_cell_numbers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_language_indicators: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_copy_button: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_line_numbers: Option<bool>,
}

/// Output format as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Html,
    Page,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectiveConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emit: Option<EmitMode>,
}

impl RenderConfig {
    /// Fields set in `other` replace fields set here
    #[must_use]
    pub fn overlay(self, other: Self) -> Self {
        Self {
            format: other.format.or(self.format),
            hide_code: other.hide_code.or(self.hide_code),
            show_outputs: other.show_outputs.or(self.show_outputs),
            show_cell_numbers: other.show_cell_numbers.or(self.show_cell_numbers),
            show_language_indicators: other
                .show_language_indicators
                .or(self.show_language_indicators),
            interactive: other.interactive.or(self.interactive),
            show_copy_button: other.show_copy_button.or(self.show_copy_button),
            show_line_numbers: other.show_line_numbers.or(self.show_line_numbers),
        }
    }

    /// Built-in defaults with configured values applied
    #[must_use]
    pub fn render_options(&self) -> RenderOptions {
        let defaults = RenderOptions::default();
        RenderOptions::default()
            .with_hide_code(self.hide_code.unwrap_or(defaults.hide_code))
            .with_show_outputs(self.show_outputs.unwrap_or(defaults.show_outputs))
            .with_show_cell_numbers(self.show_cell_numbers.unwrap_or(defaults.show_cell_numbers))
            .with_show_language_indicators(
                self.show_language_indicators
                    .unwrap_or(defaults.show_language_indicators),
            )
            .with_interactive(self.interactive.unwrap_or(defaults.interactive))
            .with_show_copy_button(self.show_copy_button.unwrap_or(defaults.show_copy_button))
            .with_show_line_numbers(self.show_line_numbers.unwrap_or(defaults.show_line_numbers))
    }
}

impl DirectiveConfig {
    /// Fields set in `other` replace fields set here
    #[must_use]
    pub fn overlay(self, other: Self) -> Self {
        Self {
            base_dir: other.base_dir.or(self.base_dir),
            component_name: other.component_name.or(self.component_name),
            emit: other.emit.or(self.emit),
        }
    }

    /// Built-in defaults with configured values applied
    #[must_use]
    pub fn directive_options(&self, render: RenderOptions) -> DirectiveOptions {
        let mut options = DirectiveOptions::default().with_render_options(render);
        if let Some(base_dir) = &self.base_dir {
            options = options.with_base_dir(base_dir);
        }
        if let Some(name) = &self.component_name {
            options = options.with_component_name(name);
        }
        if let Some(emit) = self.emit {
            options = options.with_emit(emit);
        }
        options
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            // TOML errors include line/column information, preserve it
            eprintln!("{} {}", "Parse error:".yellow().bold(), e);
            eprintln!("{} Configuration file syntax:", "Help:".cyan().bold());
            eprintln!("  [render]");
            eprintln!("  format = \"page\"  # html, page, or json");
            eprintln!("  hide_code = false");
            eprintln!("  [directive]");
            eprintln!("  emit = \"component\"  # component or html");
            anyhow::anyhow!("Failed to parse config file {}: {e}", path.display())
        })
    }

    /// Path of the user config file, if a home directory is known
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    /// Load an optional config file; a broken file is reported and skipped
    fn load_optional(path: &Path, label: &str) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => {
                log::debug!("loaded {label} config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                eprintln!(
                    "{} Failed to load {} config from {}: {}",
                    "Warning:".yellow().bold(),
                    label,
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Merge user, project and explicit configs.
    ///
    /// An explicit `--config` file that cannot be loaded is an error.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let user = Self::user_config_path().and_then(|path| Self::load_optional(&path, "user"));
        let project = Self::load_optional(Path::new(CONFIG_FILE_NAME), "project");
        let explicit = explicit.map(Self::load_from_file).transpose()?;

        Ok([user, project, explicit]
            .into_iter()
            .flatten()
            .fold(Self::default(), Self::merge))
    }

    /// Field-wise merge; values set in `other` win
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            render: merge_section(self.render, other.render, RenderConfig::overlay),
            directive: merge_section(self.directive, other.directive, DirectiveConfig::overlay),
        }
    }

    /// Effective render section
    #[must_use]
    pub fn render(&self) -> RenderConfig {
        self.render.unwrap_or_default()
    }

    /// Effective directive section
    #[must_use]
    pub fn directive(&self) -> DirectiveConfig {
        self.directive.clone().unwrap_or_default()
    }
}

fn merge_section<T>(base: Option<T>, other: Option<T>, overlay: fn(T, T) -> T) -> Option<T> {
    match (base, other) {
        (Some(base), Some(other)) => Some(overlay(base, other)),
        (base, other) => other.or(base),
    }
}
