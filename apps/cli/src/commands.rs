//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use podfic_core::{HtmlForm, ProgressReporter, import_and_fill};
use podfic_fetch::HttpFetcher;
use podfic_shared::store::keys;
use podfic_shared::{
    AppConfig, ImportOptions, ImportResult, JsonFileStore, get_typed, init_config, load_config,
    load_import_settings, session_cookie, set_typed, setup_storage, store_path,
};
use podfic_template::{check_rich_template, check_title_template, preview_rich, preview_title};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// podfic-import: pre-fill a podfic posting from the work it is based on.
#[derive(Parser)]
#[command(
    name = "podfic-import",
    version,
    about = "Import an archive work's metadata into a new podfic work form.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Import a work and fill in a saved new-work form page.
    Import {
        /// Saved HTML of the archive's new-work page.
        #[arg(short, long)]
        form: PathBuf,

        /// Work URL to import (stored as the current URL before running).
        #[arg(short, long)]
        url: Option<String>,

        /// Write the recorded form edits here as JSON.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show previews and warnings for the stored templates.
    Preview,

    /// Manage the settings store.
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },

    /// Manage configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum StoreAction {
    /// Seed missing settings with defaults and migrate old option flags.
    Init,
    /// Print every stored setting.
    Show,
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Create the default config file (~/.podfic-import/podfic-import.toml).
    Init,
    /// Show the current config.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

const CRATES: [&str; 6] = [
    "podfic_import",
    "podfic_core",
    "podfic_fetch",
    "podfic_extract",
    "podfic_template",
    "podfic_shared",
];

/// Initialize the tracing subscriber based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&filter));

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
    match cli.command {
        Command::Import { form, url, out } => {
            cmd_import(&form, url.as_deref(), out.as_deref()).await
        }
        Command::Preview => cmd_preview().await,
        Command::Store { action } => match action {
            StoreAction::Init => cmd_store_init().await,
            StoreAction::Show => cmd_store_show().await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn open_store(config: &AppConfig) -> Result<JsonFileStore> {
    Ok(JsonFileStore::new(store_path(config)?))
}

async fn cmd_import(form_path: &Path, url: Option<&str>, out: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;
    setup_storage(&store).await?;

    if let Some(url) = url {
        let mut options: ImportOptions = get_typed(&store, keys::OPTIONS)
            .await?
            .unwrap_or_default();
        options.url = url.trim().to_string();
        set_typed(&store, keys::OPTIONS, &options).await?;
        info!(url = %options.url, "stored work URL");
    }

    let page = tokio::fs::read_to_string(form_path)
        .await
        .wrap_err_with(|| format!("failed to read form page {}", form_path.display()))?;
    let mut form = HtmlForm::parse(&page)?;

    let fetcher = HttpFetcher::new(&config, session_cookie(&config))?;
    let progress = CliProgress::new()?;
    let result = import_and_fill(&store, &fetcher, &mut form, &progress).await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(out) = out {
        let edits = serde_json::to_string_pretty(&form.into_edits())?;
        tokio::fs::write(out, edits)
            .await
            .wrap_err_with(|| format!("failed to write edits to {}", out.display()))?;
        println!("Form edits written to: {}", out.display());
    }
    Ok(())
}

/// CLI progress reporter using indicatif.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { spinner })
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &ImportResult) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_preview() -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let templates = load_import_settings(&store).await?.templates;

    print_preview(
        "Title",
        &preview_title(&templates.title.default),
        check_title_template(&templates.title.default),
    );
    for (name, template) in [
        ("Summary", &templates.summary.default),
        ("Notes", &templates.notes.default),
        ("Work body", &templates.workbody.default),
    ] {
        print_preview(name, &preview_rich(template), check_rich_template(template));
    }
    Ok(())
}

fn print_preview(name: &str, preview: &str, warning: Option<&str>) {
    println!("== {name} ==");
    println!("{preview}");
    if let Some(warning) = warning {
        println!("warning: {warning}");
    }
    println!();
}

async fn cmd_store_init() -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;
    setup_storage(&store).await?;
    println!("Store initialized at: {}", store.path().display());
    Ok(())
}

async fn cmd_store_show() -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let values = store.read_all().await?;
    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
