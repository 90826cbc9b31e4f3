//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use mimegen_core::pipeline::{BuildResult, ProgressReporter};
use mimegen_shared::{
    AppConfig, BuildConfig, MimeTable, init_config, load_config, load_config_from,
    parse_emit_list,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// mimegen — build the file extension → media type table.
#[derive(Parser)]
#[command(
    name = "mimegen",
    version,
    about = "Build a file extension to MIME type table from mime.types and the IANA registry.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.mimegen/mimegen.toml.
    #[arg(long = "config", global = true, env = "MIMEGEN_CONFIG")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch both sources, merge them, and write the artifacts.
    Build {
        /// Output directory for the artifacts.
        #[arg(short, long)]
        out: Option<String>,

        /// Artifacts to emit (comma-separated: rust, json).
        #[arg(long)]
        emit: Option<String>,

        /// Maximum detail pages fetched at once.
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Override file location (URL or path).
        #[arg(long)]
        override_source: Option<String>,

        /// Registry document location (URL or path).
        #[arg(long)]
        registry_source: Option<String>,
    },

    /// Look up a media type in an emitted JSON table.
    Lookup {
        /// Extension (without the dot) or, with --path, a file path.
        query: String,

        /// JSON table written by `build`.
        #[arg(short, long, default_value = "generated/mime_types.json")]
        table: PathBuf,

        /// Treat the query as a path and use its extension.
        #[arg(long)]
        path: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "mimegen=info",
        1 => "mimegen=debug",
        _ => "mimegen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_file.as_deref();
    match cli.command {
        Command::Build {
            out,
            emit,
            concurrency,
            override_source,
            registry_source,
        } => {
            let overrides = BuildOverrides {
                out,
                emit,
                concurrency,
                override_source,
                registry_source,
            };
            cmd_build(config_path, overrides).await
        }
        Command::Lookup { query, table, path } => cmd_lookup(&query, &table, path),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Build flags that take precedence over the config file.
#[derive(Debug, Default)]
struct BuildOverrides {
    out: Option<String>,
    emit: Option<String>,
    concurrency: Option<usize>,
    override_source: Option<String>,
    registry_source: Option<String>,
}

impl BuildOverrides {
    fn apply(self, config: &mut AppConfig) -> Result<()> {
        if let Some(out) = self.out {
            config.build.output_dir = out;
        }
        if let Some(emit) = self.emit {
            config.build.emit = parse_emit_list(&emit)?;
        }
        if let Some(concurrency) = self.concurrency {
            config.build.concurrency = concurrency;
        }
        if let Some(source) = self.override_source {
            config.sources.override_source = source;
        }
        if let Some(source) = self.registry_source {
            config.sources.registry_source = source;
        }
        Ok(())
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(config_path: Option<&Path>, overrides: BuildOverrides) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    overrides.apply(&mut config)?;
    let build_config = BuildConfig::from_app_config(&config)?;

    info!(
        overrides = %build_config.override_source,
        registry = %build_config.registry_source,
        out = %build_config.output_dir.display(),
        concurrency = build_config.concurrency,
        "building media type table"
    );

    let reporter = CliProgress::new();
    let result = mimegen_core::pipeline::build(&build_config, &reporter).await;
    if result.is_err() {
        reporter.spinner.finish_and_clear();
    }
    let result = result?;

    println!();
    println!("  Media type table built.");
    println!("  Entries:    {}", result.outcome.mapping.len());
    println!("  Overrides:  {}", result.override_count);
    println!(
        "  Registry:   {} records, {} detail pages ({} skipped)",
        result.record_count, result.enrich.submitted, result.enrich.skipped
    );
    println!("  Conflicts:  {}", result.outcome.conflicts.len());
    for artifact in &result.artifacts {
        println!(
            "  Wrote:      {}",
            result.output_dir.join(&artifact.filename).display()
        );
    }
    println!("  Manifest:   {}", result.manifest_path.display());
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_lookup(query: &str, table: &Path, as_path: bool) -> Result<()> {
    if !table.exists() {
        return Err(eyre!(
            "no table at '{}' — run `mimegen build` first or pass --table",
            table.display()
        ));
    }

    let table = MimeTable::from_json_file(table)?;
    let media_type = if as_path {
        table.detect_file_path(query)
    } else {
        table.detect_file_ext(query.strip_prefix('.').unwrap_or(query))
    };

    println!("{media_type}");
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}
