#![allow(
    clippy::needless_pass_by_value,    // clap requires owned strings
    clippy::fn_params_excessive_bools, // CLI commands have many boolean flags
    clippy::must_use_candidate,        // CLI functions don't need must_use
)]

//! notebook-mdx CLI - render Jupyter notebooks for MDX documentation
//!
//! - `render`: notebook JSON (file or stdin) to an HTML fragment, a
//!   standalone page, or the JSON content tree
//! - `directive`: expand `::notebook` directives in an MDX file
//! - `config`: create or show `.notebook-mdx.toml`
//! - `completions`: shell completion scripts

mod config;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use colored::Colorize;
use config::{Config, ConfigFormat, RenderConfig, CONFIG_FILE_NAME, DEFAULT_CONFIG};
use notebook_mdx_core::model::parse_notebook_from_str;
use notebook_mdx_core::{NotebookRenderer, RenderOptions, RenderTarget, RenderedNotebook};
use notebook_mdx_directive::{DirectiveProcessor, EmitMode};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Verbose output with extra details
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if output should be shown (not quiet)
    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Default `log` filter; `RUST_LOG` overrides it
    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "debug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
enum OutputFormat {
    /// HTML fragment (default)
    Html,
    /// Standalone HTML page with the notebook stylesheet
    Page,
    /// JSON content tree with degradations
    Json,
}

impl From<ConfigFormat> for OutputFormat {
    fn from(format: ConfigFormat) -> Self {
        match format {
            ConfigFormat::Html => Self::Html,
            ConfigFormat::Page => Self::Page,
            ConfigFormat::Json => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
enum EmitArg {
    /// `<NotebookLoader notebookDataJson={...} />`
    Component,
    /// Pre-rendered markup
    Html,
}

impl From<EmitArg> for EmitMode {
    fn from(arg: EmitArg) -> Self {
        match arg {
            EmitArg::Component => Self::Component,
            EmitArg::Html => Self::Html,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "notebook-mdx",
    about = "Render Jupyter notebooks for MDX documentation",
    long_about = "Render Jupyter notebooks (.ipynb) to HTML and expand ::notebook directives\n\
                  in MDX documents.",
    version
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Read configuration from this file (overrides user and project config)
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a notebook to HTML or a JSON content tree
    #[command(long_about = "Render a notebook to an HTML fragment, a standalone page, or a JSON\n\
                      content tree.\n\
                      \n\
                      Examples:\n\
                        notebook-mdx render analysis.ipynb\n\
                        notebook-mdx render analysis.ipynb --format page -o analysis.html\n\
                        cat analysis.ipynb | notebook-mdx render - --hide-code\n\
                      \n\
                      Defaults can be set via .notebook-mdx.toml configuration file.")]
    Render {
        /// Notebook path, or '-' to read from stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Page title (page format only; default: input file name)
        #[arg(long)]
        title: Option<String>,

        /// Hide code inputs
        #[arg(long)]
        hide_code: bool,

        /// Do not render outputs
        #[arg(long)]
        no_outputs: bool,

        /// Hide "In [n]:" / "Out[n]:" prompts
        #[arg(long)]
        no_cell_numbers: bool,

        /// Hide the language label on code cells
        #[arg(long)]
        no_language_indicators: bool,

        /// Render charts as a static view instead of embedding them
        #[arg(long = "static")]
        static_charts: bool,

        /// Add a copy button to code inputs
        #[arg(long)]
        copy_button: bool,

        /// Show line numbers on code inputs
        #[arg(long)]
        line_numbers: bool,

        /// Fail if any output had to fall back to a degraded rendering
        #[arg(long)]
        strict: bool,
    },

    /// Expand ::notebook directives in an MDX document
    #[command(long_about = "Replace ::notebook{file=\"...\"} directives in an MDX document with a\n\
                      component element (or pre-rendered HTML) carrying the notebook.\n\
                      \n\
                      Examples:\n\
                        notebook-mdx directive docs/guide.mdx -o build/guide.mdx\n\
                        notebook-mdx directive docs/guide.mdx --emit html\n\
                        notebook-mdx directive docs/guide.mdx --list-deps")]
    Directive {
        /// MDX path, or '-' to read from stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Directory notebook paths are resolved against
        #[arg(long, value_name = "DIR")]
        base_dir: Option<PathBuf>,

        /// Component name emitted for each directive
        #[arg(long, value_name = "NAME")]
        component: Option<String>,

        /// What each directive is replaced with
        #[arg(long, value_enum)]
        emit: Option<EmitArg>,

        /// Print the referenced notebook paths instead of the document
        #[arg(long)]
        list_deps: bool,
    },

    /// Manage configuration settings
    #[command(long_about = "Manage notebook-mdx configuration files.\n\
                      \n\
                      Configuration files are loaded in this order (later overrides earlier):\n\
                        1. User config: ~/.notebook-mdx.toml\n\
                        2. Project config: ./.notebook-mdx.toml\n\
                        3. --config <PATH>\n\
                        4. Command-line arguments")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(visible_alias = "completion")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Create a new .notebook-mdx.toml with commented defaults
    Init {
        /// Create in user home directory instead of current directory
        #[arg(long)]
        global: bool,

        /// Overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Display the current effective configuration
    Show {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

/// Render flags as given on the command line
#[derive(Debug, Clone, Copy, Default)]
struct RenderFlags {
    hide_code: bool,
    no_outputs: bool,
    no_cell_numbers: bool,
    no_language_indicators: bool,
    static_charts: bool,
    copy_button: bool,
    line_numbers: bool,
}

impl RenderFlags {
    /// Config values with flags applied; a flag only ever moves a value
    /// away from its default
    fn apply(self, config: &RenderConfig) -> RenderOptions {
        let mut options = config.render_options();
        if self.hide_code {
            options = options.with_hide_code(true);
        }
        if self.no_outputs {
            options = options.with_show_outputs(false);
        }
        if self.no_cell_numbers {
            options = options.with_show_cell_numbers(false);
        }
        if self.no_language_indicators {
            options = options.with_show_language_indicators(false);
        }
        if self.static_charts {
            options = options.with_interactive(false);
        }
        if self.copy_button {
            options = options.with_show_copy_button(true);
        }
        if self.line_numbers {
            options = options.with_show_line_numbers(true);
        }
        options
    }
}

fn init_logging(verbosity: Verbosity) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(verbosity.log_filter()))
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);
    init_logging(verbosity);

    if let Err(e) = run(args, verbosity) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: Args, verbosity: Verbosity) -> Result<()> {
    match args.command {
        Commands::Render {
            input,
            output,
            format,
            title,
            hide_code,
            no_outputs,
            no_cell_numbers,
            no_language_indicators,
            static_charts,
            copy_button,
            line_numbers,
            strict,
        } => {
            let config = Config::discover(args.config_file.as_deref())?;
            let render_config = config.render();
            let format = format
                .or_else(|| render_config.format.map(OutputFormat::from))
                .unwrap_or(OutputFormat::Html);
            let flags = RenderFlags {
                hide_code,
                no_outputs,
                no_cell_numbers,
                no_language_indicators,
                static_charts,
                copy_button,
                line_numbers,
            };
            render_command(
                &input,
                output.as_deref(),
                format,
                title,
                flags.apply(&render_config),
                strict,
                verbosity,
            )
        }
        Commands::Directive {
            input,
            output,
            base_dir,
            component,
            emit,
            list_deps,
        } => {
            let config = Config::discover(args.config_file.as_deref())?;
            let mut options = config
                .directive()
                .directive_options(config.render().render_options());
            if let Some(base_dir) = base_dir {
                options = options.with_base_dir(base_dir);
            }
            if let Some(component) = component {
                options = options.with_component_name(component);
            }
            if let Some(emit) = emit {
                options = options.with_emit(emit.into());
            }
            directive_command(
                &input,
                output.as_deref(),
                DirectiveProcessor::new(options),
                list_deps,
                verbosity,
            )
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { global, force } => config_init(global, force, verbosity),
            ConfigAction::Show { json } => config_show(args.config_file.as_deref(), json),
        },
        Commands::Completions { shell } => completion_command(shell),
    }
}

/// Read a file, or stdin for "-"
fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
}

/// Write to a file, or stdout when no output path is given
fn write_output(output: Option<&Path>, content: &str, verbosity: Verbosity) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
            fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if verbosity.should_show_output() {
                eprintln!("{} Wrote {}", "Success:".green().bold(), path.display());
            }
        }
        None => print!("{content}"),
    }
    Ok(())
}

/// Fill every deferred slot before the output is written
fn settle(rendered: RenderedNotebook) -> Result<RenderedNotebook> {
    if rendered.is_settled() {
        return Ok(rendered);
    }
    log::debug!("hydrating {} deferred slot(s)", rendered.deferred.len());
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime
        .block_on(rendered.hydrated())
        .context("Failed to hydrate deferred outputs")
}

fn render_command(
    input: &str,
    output: Option<&Path>,
    format: OutputFormat,
    title: Option<String>,
    options: RenderOptions,
    strict: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let json = read_input(input)?;
    let notebook = parse_notebook_from_str(&json)
        .with_context(|| format!("Failed to load notebook {input}"))?;
    log::debug!("{input}: {} cell(s)", notebook.cells.len());

    let renderer = NotebookRenderer::new(options);
    let mut target = RenderTarget::new();
    let rendered = match format {
        OutputFormat::Page => renderer.render_into(&mut target, &notebook),
        OutputFormat::Html | OutputFormat::Json => renderer.render(&notebook),
    };
    let rendered = settle(rendered)?;

    if !rendered.degradations.is_empty() {
        if verbosity.should_show_output() {
            eprintln!(
                "{} {} output(s) rendered with a fallback",
                "Warning:".yellow().bold(),
                rendered.degradations.len()
            );
        }
        if strict {
            anyhow::bail!(
                "{} output(s) could not be fully rendered: {}",
                rendered.degradations.len(),
                rendered
                    .degradations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        }
    }

    let content = match format {
        OutputFormat::Html => format!("{}\n", rendered.to_html()),
        OutputFormat::Page => {
            let title = title.unwrap_or_else(|| page_title(input));
            target.to_html_page(&title, &rendered.to_html())
        }
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&rendered)?),
    };
    write_output(output, &content, verbosity)
}

/// Input file stem, or "Notebook" for stdin
fn page_title(input: &str) -> String {
    if input == "-" {
        return "Notebook".to_string();
    }
    Path::new(input)
        .file_stem()
        .map_or_else(|| "Notebook".to_string(), |stem| stem.to_string_lossy().into_owned())
}

fn directive_command(
    input: &str,
    output: Option<&Path>,
    processor: DirectiveProcessor,
    list_deps: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let source = read_input(input)?;
    let document_path = (input != "-").then(|| Path::new(input));
    let processed = processor.process(&source, document_path)?;
    log::debug!(
        "{input}: expanded {} directive(s), {} notebook file(s)",
        processed.notebooks,
        processed.dependencies.len()
    );

    if list_deps {
        let listing: String = processed
            .dependencies
            .iter()
            .map(|path| format!("{}\n", path.display()))
            .collect();
        return write_output(output, &listing, verbosity);
    }
    write_output(output, &processed.content, verbosity)
}

fn config_path(global: bool) -> Result<PathBuf> {
    if global {
        Config::user_config_path().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
    } else {
        Ok(PathBuf::from(CONFIG_FILE_NAME))
    }
}

fn config_init(global: bool, force: bool, verbosity: Verbosity) -> Result<()> {
    let config_path = config_path(global)?;

    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            config_path.display()
        );
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    if verbosity.should_show_output() {
        println!(
            "{} Created configuration file: {}",
            "Success:".green().bold(),
            config_path.display()
        );
    }
    Ok(())
}

/// Display the current effective configuration
fn config_show(explicit: Option<&Path>, json_output: bool) -> Result<()> {
    let merged = Config::discover(explicit)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&merged)?);
    } else {
        println!("{}", toml::to_string_pretty(&merged)?);
    }
    Ok(())
}

fn completion_command(shell: Shell) -> Result<()> {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
