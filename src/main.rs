// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;

use bestpapers::app_config::{self, Config};
use bestpapers::app_controller::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse the README, then resolve and download every paper (default command)
    Run(RunArgs),

    /// Parse the README and print the papers found, without searching or downloading
    Parse {
        #[command(flatten)]
        common: CommonArgs,

        /// Print the parse result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions for bestpapers
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// README URL or local file (overrides the config)
    #[arg(short, long)]
    source: Option<String>,

    /// Comma-separated section names, in priority order (overrides the config)
    #[arg(long, value_delimiter = ',')]
    sections: Option<Vec<String>>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(clap::Args, Debug, Clone)]
struct RunArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Directory receiving the PDFs (overrides the config)
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Papers processed at the same time (overrides the config)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Semantic Scholar API key
    #[arg(long, env = "SEMANTIC_SCHOLAR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Do not draw a progress bar
    #[arg(long)]
    no_progress: bool,
}

/// bestpapers - mirror the PDFs of a curated "best papers" list
#[derive(Parser, Debug)]
#[command(name = "bestpapers")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(about = "Download the papers listed in a best-papers README")]
#[command(long_about = "bestpapers reads a curated markdown list of award-winning papers, groups them by venue,
looks each one up on Semantic Scholar (then arXiv) and downloads the PDFs. Re-running is safe:
files that are already present are skipped.

EXAMPLES:
    bestpapers                                  # Run with conf.json (created if missing)
    bestpapers run -s README.md -o pdfs         # Use a local README and output directory
    bestpapers run --sections CVPR,ICCV         # Only look at two venues
    bestpapers parse --json                     # Show what the parser finds
    bestpapers completions bash > bestpapers.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger itself lets everything through; filtering happens via max_level
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "bestpapers", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Parse { common, json }) => run_parse(common, json).await,
        Some(Commands::Run(args)) => run_pipeline(args).await,
        None => run_pipeline(cli.run).await,
    }
}

async fn run_pipeline(args: RunArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;

    if let Some(output_dir) = &args.output_dir {
        config.download.output_dir = output_dir.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.download.concurrent_downloads = concurrency;
    }
    if let Some(api_key) = &args.api_key {
        config.search.semantic_scholar_api_key = api_key.clone();
    }

    let controller = Controller::with_config(config)?.with_progress(!args.no_progress);
    let report = controller.run().await?;

    info!(
        "Process completed: {} downloaded, {} already existed, {} failed",
        report.stats.downloaded, report.stats.already_existed, report.stats.failed
    );
    Ok(())
}

async fn run_parse(common: CommonArgs, json: bool) -> Result<()> {
    let config = load_config(&common)?;
    let controller = Controller::with_config(config)?;

    let text = controller.fetch_document().await?;
    let parsed = controller.parse_document(&text);

    let mut stdout = std::io::stdout();
    if json {
        let output = serde_json::to_string_pretty(&parsed).context("Failed to serialize parse result")?;
        writeln!(stdout, "{}", output)?;
    } else {
        for section in parsed.iter() {
            writeln!(stdout, "## {} ({})", section.name, section.papers.len())?;
            for paper in &section.papers {
                writeln!(stdout, "- {}", paper.title)?;
            }
        }
    }
    Ok(())
}

/// Load the config file (creating a default one when missing) and apply CLI overrides
fn load_config(options: &CommonArgs) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .with_context(|| format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(source) = &options.source {
        config.source = source.clone();
    }
    if let Some(sections) = &options.sections {
        config.sections = sections.iter().map(|s| s.trim().to_string()).collect();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}
