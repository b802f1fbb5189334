//! Configuration module for the radio bot.
//!
//! Handles loading of Telegram credentials and bot settings from the
//! environment.

mod settings;

pub use settings::{BotSettings, ConfigError, TelegramConfig};

/// Telegram user id of the only account allowed to register groups and
/// upload songs.
pub const BOT_OWNER_ID: i64 = 1_918_624_551;
