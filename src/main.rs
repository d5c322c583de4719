mod api;
mod commands;
mod gateway;
#[cfg(test)]
mod test_support;

use clap::{Parser, Subcommand};
use gateway::{
    auth::ApiKeyGuard,
    job::JobController,
    label::{compose_label, GroupLabelUpdater},
    session::ConnectionStore,
};
use kasbot_channels::bridge::BridgePlatform;
use kasbot_core::{
    config::{self, shellexpand, BotConfig},
    traits::{AmountSource, Platform},
};
use kasbot_sheets::SheetsSource;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "kasbot",
    version,
    about = "WhatsApp group bot with a spreadsheet-driven balance label"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, env = "KASBOT_CONFIG", default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot: platform session, chat commands, HTTP API.
    Start,
    /// Print a summary of the loaded configuration.
    Status,
    /// Fetch the amount once and print the label that would be set.
    CheckSheet,
}

/// Log to stdout and `{data_dir}/logs/kasbot.log`. Keep the guard alive.
fn init_logging(bot: &BotConfig) -> anyhow::Result<WorkerGuard> {
    let log_dir = PathBuf::from(shellexpand(&bot.data_dir)).join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, "kasbot.log"));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&bot.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    Ok(guard)
}

/// Stdout-only logging for one-shot subcommands.
fn init_console_logging(bot: &BotConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&bot.log_level)),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load(&cli.config)?;
    cfg.apply_env_overrides();

    match cli.command {
        Commands::Start => {
            let _log_guard = init_logging(&cfg.bot)?;
            cfg.validate()?;

            let platform: Arc<dyn Platform> = Arc::new(BridgePlatform::new(cfg.bridge.clone()));
            let source: Arc<dyn AmountSource> = Arc::new(SheetsSource::new(cfg.sheet.clone()));
            let session = Arc::new(ConnectionStore::new());
            let updater = Arc::new(GroupLabelUpdater::new(platform.clone()));
            let jobs = Arc::new(JobController::new(source, updater, &cfg.job));

            println!("kasbot: starting {}...", cfg.bot.name);
            let gw = Arc::new(gateway::Gateway::new(
                platform,
                session,
                jobs,
                cfg.api.clone(),
                ApiKeyGuard::new(cfg.api.api_key.clone()),
                cfg.job.autostart,
            ));
            gw.run().await?;
        }
        Commands::Status => {
            println!("kasbot: status\n");
            println!("Config: {}", cli.config);
            println!("Data dir: {}", shellexpand(&cfg.bot.data_dir));
            println!("API: {}:{}", cfg.api.host, cfg.api.port);
            println!(
                "  api key: {}",
                if cfg.api.api_key.is_empty() {
                    "missing"
                } else {
                    "set"
                }
            );
            println!("Bridge: {}", cfg.bridge.url);
            println!(
                "  allowed users: {}",
                if cfg.bridge.allowed_users.is_empty() {
                    "everyone".to_string()
                } else {
                    cfg.bridge.allowed_users.join(", ")
                }
            );
            println!(
                "Sheet: {} (first sheet, cell {})",
                if cfg.sheet.spreadsheet_id.is_empty() {
                    "not configured"
                } else {
                    cfg.sheet.spreadsheet_id.as_str()
                },
                cfg.sheet.range
            );
            println!(
                "Job: group {} every {}s{}",
                if cfg.job.group_id.is_empty() {
                    "not configured"
                } else {
                    cfg.job.group_id.as_str()
                },
                cfg.job.interval_secs,
                if cfg.job.autostart { " (autostart)" } else { "" }
            );
            println!();

            match cfg.validate() {
                Ok(()) => println!("  config: ok"),
                Err(e) => println!("  config: {e}"),
            }
        }
        Commands::CheckSheet => {
            init_console_logging(&cfg.bot);
            cfg.validate_sheet()?;

            let source = SheetsSource::new(cfg.sheet.clone());
            let amount = source.fetch_latest_amount().await?;
            println!("Cell:   {}", amount.display);
            println!("Value:  {}", amount.value);
            println!("Label:  {}", compose_label(&amount, &cfg.job.label_prefix));
        }
    }

    Ok(())
}
