//! CLI command definitions, routing, and tracing setup.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use bandmeta_core::pipeline::{ProgressReporter, query_band};
use bandmeta_shared::{AppConfig, BandDescription, QueryConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// bandmeta: artist metadata as JSON.
#[derive(Parser)]
#[command(
    name = "bandmeta",
    version,
    about = "Extract structured artist metadata (stats, wiki, tags, similar artists, events) as JSON.",
    long_about = None,
    args_conflicts_with_subcommands = true,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub query: QueryArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Flags of the default (query) command.
#[derive(Args, Debug)]
pub(crate) struct QueryArgs {
    /// Band name; several words are joined with spaces.
    #[arg(value_name = "BAND")]
    pub band_words: Vec<String>,

    /// Band name (alternative to the positional words).
    #[arg(long, conflicts_with = "band_words")]
    pub band: Option<String>,

    /// Include members, biography, and references from the wiki page.
    #[arg(long)]
    pub wiki: bool,

    /// Include tags and the sidebar similar artists.
    #[arg(long)]
    pub tags: bool,

    /// Collect the paginated similar-artists listing.
    #[arg(long)]
    pub similar_artists: bool,

    /// Include event years.
    #[arg(long)]
    pub events: bool,

    /// Quoting template for hyperlinked wiki text (%q, %s, %v, %%).
    #[arg(long)]
    pub wiki_ref_format: Option<String>,

    /// Number of similar-artists pages to read.
    #[arg(long)]
    pub similar_artists_pages: Option<u32>,

    /// Similar-artists pages to skip before reading.
    #[arg(long)]
    pub similar_artists_pages_offset: Option<u32>,

    /// Workers for the similar-artists listing; 1 reads sequentially.
    #[arg(long)]
    pub workers: Option<u32>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
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

impl QueryArgs {
    /// Band name from `--band` or the joined positional words.
    fn band_name(&self) -> String {
        match &self.band {
            Some(band) => band.clone(),
            None => self.band_words.join(" "),
        }
    }

    /// Merge flags over the file config; flags win.
    pub(crate) fn to_query(&self, config: &AppConfig) -> QueryConfig {
        let mut query = QueryConfig::new(self.band_name(), config);

        query.stages.wiki = self.wiki;
        query.stages.tags = self.tags;
        query.stages.similar_artists = self.similar_artists;
        query.stages.events = self.events;

        if let Some(format) = &self.wiki_ref_format {
            query.wiki_ref_format = format.clone();
        }
        if let Some(pages) = self.similar_artists_pages {
            query.pages = pages;
        }
        if let Some(offset) = self.similar_artists_pages_offset {
            query.page_offset = offset;
        }
        if let Some(workers) = self.workers {
            query.workers = workers;
        }

        query
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "bandmeta=info",
        1 => "bandmeta=debug",
        _ => "bandmeta=trace",
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
    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
        None => cmd_query(&cli.query).await,
    }
}

async fn cmd_query(args: &QueryArgs) -> Result<()> {
    let config = load_config()?;
    let query = args.to_query(&config);

    info!(
        band = %query.band,
        workers = query.workers,
        pages = query.pages,
        "querying band"
    );

    let reporter = CliProgress::new();
    let result = query_band(&query, &reporter).await;
    reporter.clear();

    let description = result?;
    println!("{}", serde_json::to_string(&description)?);

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &BandDescription) {
        self.spinner.finish_and_clear();
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bandmeta").chain(args.iter().copied()))
            .expect("parse")
    }

    #[test]
    fn positional_words_are_joined() {
        let cli = parse(&["The", "Jesus", "and", "Mary", "Chain", "--tags"]);
        let query = cli.query.to_query(&AppConfig::default());
        assert_eq!(query.band, "The Jesus and Mary Chain");
        assert!(query.stages.tags);
        assert!(!query.stages.wiki);
    }

    #[test]
    fn flags_override_file_defaults() {
        let mut config = AppConfig::default();
        config.defaults.workers = 2;
        config.defaults.pages = 9;

        let cli = parse(&[
            "--band",
            "Slowdive",
            "--similar-artists",
            "--similar-artists-pages",
            "3",
            "--similar-artists-pages-offset",
            "1",
            "--wiki-ref-format",
            "[%s]",
        ]);
        let query = cli.query.to_query(&config);
        assert_eq!(query.band, "Slowdive");
        assert_eq!(query.pages, 3);
        assert_eq!(query.page_offset, 1);
        assert_eq!(query.workers, 2);
        assert_eq!(query.wiki_ref_format, "[%s]");
    }

    #[test]
    fn band_flag_conflicts_with_positional_words() {
        let result = Cli::try_parse_from(["bandmeta", "Ride", "--band", "Lush"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_subcommand_parses() {
        let cli = parse(&["config", "show"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Show
            })
        ));
    }

    #[test]
    fn verbosity_counts() {
        let cli = parse(&["-vv", "Slowdive"]);
        assert_eq!(cli.verbose, 2);
    }
}
