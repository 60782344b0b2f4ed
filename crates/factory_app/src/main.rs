mod config;
mod render;
mod runner;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use factory_logging::{factory_info, factory_warn, LogDestination};

use config::{AppConfig, Overrides};

const LOG_FILENAME: &str = "api_factory.log";

/// Turns API specification spreadsheets into request collections and test suites.
#[derive(Parser)]
#[command(name = "api-factory", version, about)]
struct Cli {
    /// Root URL of the generation service
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// RON config file (default: ./api_factory.ron when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Where log output goes: terminal, file or both
    #[arg(long, global = true)]
    log: Option<LogDestination>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a spreadsheet, follow processing and download the results
    Generate {
        /// The .xlsx specification to upload
        file: PathBuf,

        /// Directory for the downloaded artifacts
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Download the blank spreadsheet template
    Template {
        /// Directory for the template
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let output_dir = match &self.command {
            Command::Generate { out, .. } | Command::Template { out } => out.clone(),
        };
        Overrides {
            base_url: self.base_url.clone(),
            output_dir,
            log_destination: self.log,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let working_dir = std::env::current_dir().context("cannot determine working directory")?;
    let mut config = AppConfig::load(cli.config.as_deref(), &working_dir)?;
    config.apply(cli.overrides());

    let level = factory_logging::parse_level(&config.log_level)
        .with_context(|| format!("unknown log level '{}'", config.log_level))?;
    factory_logging::initialize(config.log_destination, level, Path::new(LOG_FILENAME));
    factory_info!("api-factory starting base_url={}", config.base_url);

    let settings = config.client_settings()?;
    let code = match &cli.command {
        Command::Generate { file, .. } => {
            runner::generate(&settings, file, &config.output_dir, interrupted()).await?
        }
        Command::Template { .. } => runner::template(&settings, &config.output_dir).await?,
    };
    Ok(code)
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        factory_warn!("Cannot listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
}
