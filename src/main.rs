//! Squonk Radio - Main Entry Point
//!
//! A Telegram bot that lets its owner upload MP3 files and lets registered
//! groups play them back one after another.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use squonk_radio::commands::RadioHandler;
use squonk_radio::config::{BotSettings, TelegramConfig};
use squonk_radio::library::Registry;
use squonk_radio::metadata::LoftyTagReader;
use squonk_radio::telegram::TelegramBot;

/// Telegram bot that plays MP3 playlists in groups.
#[derive(Parser, Debug)]
#[command(name = "squonk_radio")]
#[command(about = "Share MP3 playlists with your Telegram groups")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let bot_settings = BotSettings::from_env_with_defaults();

    std::fs::create_dir_all(&bot_settings.download_dir).with_context(|| {
        format!(
            "Failed to create download directory {}",
            bot_settings.download_dir.display()
        )
    })?;

    info!(
        "Owner: {}, downloads: {}",
        bot_settings.owner_id,
        bot_settings.download_dir.display()
    );

    // Connect to Telegram
    let (bot, mut updates) = TelegramBot::connect(&tg_config, bot_settings.min_send_interval_ms)
        .await
        .context("Failed to connect to Telegram")?;

    let bot = Arc::new(bot);
    let handler = RadioHandler::new(
        Arc::clone(&bot),
        LoftyTagReader::new(),
        Registry::shared(),
        &bot_settings,
    );

    info!("Bot is running. Use Ctrl+C to stop.");

    // Events are handled one at a time, in arrival order.
    loop {
        let update = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            update = updates.next() => update.context("Update stream failed")?,
        };

        let event = match bot.to_inbound(update).await {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!("Failed to read update: {}", e);
                continue;
            }
        };

        if let Err(e) = handler.handle(event).await {
            warn!("Failed to handle event: {}", e);
        }
    }

    // Cleanup
    info!("Shutting down...");
    updates.sync_update_state();
    bot.disconnect();

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
