//! Homework bot CLI
//!
//! Reads secrets from the environment (or `.env`), settings from a TOML
//! file, and polls the review API until the process is stopped.

use std::fs::OpenOptions;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use homework_bot::{
    error::{AppError, Result},
    models::{Config, Credentials, LoggingConfig, PollState},
    pipeline::PollScheduler,
    services::{PracticumClient, TelegramNotifier},
    utils::http,
};

/// Homework review status bot
#[derive(Parser, Debug)]
#[command(
    name = "homework-bot",
    version,
    about = "Reports homework review status changes to Telegram"
)]
struct Cli {
    /// Path to the TOML settings file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Initial cursor in unix seconds (default: now)
    #[arg(long, global = true)]
    from_date: Option<i64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Poll forever (default)
    Run,

    /// Run a single poll iteration and exit
    Once,

    /// Validate settings and credentials without polling
    Check,
}

/// Initialize logging from settings, with `--verbose` forcing debug.
fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    builder.format_timestamp_secs().format_target(true);

    if let Some(path) = &config.file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

/// Log a startup error before handing it back to `main`.
fn abort(error: AppError) -> AppError {
    if error.is_fatal() {
        log::error!("{}. The bot cannot start.", error);
    } else {
        log::error!("Startup failed: {}", error);
    }
    error
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv();

    let loaded = Config::load_if_present(&cli.config);
    let logging = match &loaded {
        Ok(Some(config)) => config.logging.clone(),
        _ => LoggingConfig::default(),
    };
    init_logging(&logging, cli.verbose)?;

    log::info!("Homework bot starting...");

    let config = match loaded.map_err(abort)? {
        Some(config) => config,
        None => {
            log::warn!(
                "Config file {} not found. Using defaults.",
                cli.config.display()
            );
            Config::default()
        }
    };
    match dotenv {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Ignoring unreadable .env file: {}", e),
    }

    config.validate().map_err(abort)?;
    let credentials = Credentials::from_env().map_err(abort)?;

    let command = cli.command.unwrap_or(Command::Run);
    if let Command::Check = command {
        log::info!("✓ Config OK (endpoint {})", config.api.endpoint);
        log::info!("✓ Credentials present (chat {})", credentials.chat_id);
        return Ok(());
    }

    let api = PracticumClient::new(
        http::create_api_client(&config.api).map_err(abort)?,
        &config.api.endpoint,
        &credentials.practicum_token,
    );
    let telegram = TelegramNotifier::new(
        http::create_telegram_client(&config).map_err(abort)?,
        &config.telegram.api_base,
        &credentials.telegram_token,
    );
    let scheduler = PollScheduler::new(&api, &telegram, &credentials.chat_id, &config.poll);

    let state = cli
        .from_date
        .map(PollState::starting_at)
        .unwrap_or_else(PollState::starting_now);

    match command {
        Command::Once => {
            let (state, outcome) = scheduler.poll_once(state).await;
            log::info!("Outcome: {:?}, next cursor {}", outcome, state.cursor);
        }
        _ => scheduler.run(state).await,
    }

    Ok(())
}
