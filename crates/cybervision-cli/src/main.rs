//! CyberVision CLI - Command-line administration of the holding's data
//!
//! Provides commands for:
//! - Managing countries, companies, advisors, sellers, advisories and market areas
//! - Deleting parents under a cascade or reassign policy
//! - Recording recruitments between sellers
//! - Refreshing the local cache from the backend
//! - Holding-wide reports

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cybervision_core::config::Config;
use cybervision_core::SyncError;

mod commands;
mod context;
mod notifier;
mod output;

use commands::{
    advisor::AdvisorCommand, advisory::AdvisoryCommand, company::CompanyCommand,
    config::ConfigCommand, country::CountryCommand, market_area::MarketAreaCommand,
    report::ReportCommand, seller::SellerCommand, status::StatusCommand, sync::SyncCommand,
};
use context::AppContext;
use output::{get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Parser)]
#[command(name = "cybervision", version, about = "CyberVision holding administration")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Keep every change in the local cache without contacting the backend
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage countries
    #[command(subcommand)]
    Country(CountryCommand),
    /// Manage companies
    #[command(subcommand)]
    Company(CompanyCommand),
    /// Manage advisors
    #[command(subcommand)]
    Advisor(AdvisorCommand),
    /// Manage sellers and recruitments
    #[command(subcommand)]
    Seller(SellerCommand),
    /// Manage advisories
    #[command(subcommand)]
    Advisory(AdvisoryCommand),
    /// Manage market areas
    #[command(subcommand)]
    MarketArea(MarketAreaCommand),
    /// Show holding-wide totals and ratios
    Report(ReportCommand),
    /// Reload every collection from the backend
    Sync(SyncCommand),
    /// Show backend mode and cached record counts
    Status(StatusCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load_or_default(&config_path),
    };

    // Setup tracing
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let formatter: Arc<dyn OutputFormatter> = Arc::from(get_formatter(format, cli.quiet));

    if let Commands::Config(cmd) = &cli.command {
        return cmd.execute(&config_path, format, formatter.as_ref()).await;
    }

    let ctx = AppContext::open(&config, cli.offline, formatter.clone()).await?;

    let result = match &cli.command {
        Commands::Country(cmd) => cmd.execute(&ctx, format).await,
        Commands::Company(cmd) => cmd.execute(&ctx, format).await,
        Commands::Advisor(cmd) => cmd.execute(&ctx, format).await,
        Commands::Seller(cmd) => cmd.execute(&ctx, format).await,
        Commands::Advisory(cmd) => cmd.execute(&ctx, format).await,
        Commands::MarketArea(cmd) => cmd.execute(&ctx, format).await,
        Commands::Report(cmd) => cmd.execute(&ctx, format).await,
        Commands::Sync(cmd) => cmd.execute(&ctx, format).await,
        Commands::Status(cmd) => cmd.execute(&ctx, &config, format).await,
        Commands::Config(_) => Ok(()),
    };

    if let Err(err) = result {
        let user_error = err
            .downcast_ref::<SyncError>()
            .is_some_and(SyncError::is_user_error);
        // Rejections already reached the user through the notifier
        if !(user_error && ctx.notifier.reported_error()) {
            formatter.error(&format!("{:#}", err));
        }
        std::process::exit(1);
    }
    Ok(())
}
