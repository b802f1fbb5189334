//! Application settings and Telegram configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::BOT_OWNER_ID;

/// Telegram API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    pub api_hash: String,

    /// Bot token issued by `@BotFather`.
    pub bot_token: String,

    /// Path to the session file.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("squonk.session")
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(api_id: i32, api_hash: String, bot_token: String) -> Self {
        Self {
            api_id,
            api_hash,
            bot_token,
            session_path: default_session_path(),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `BOT_TOKEN`, `TG_API_ID` and `TG_API_HASH` to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        let api_id: i32 = std::env::var("TG_API_ID")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_ID"))?
            .parse()
            .map_err(|_| ConfigError::InvalidApiId)?;

        let api_hash = std::env::var("TG_API_HASH")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_HASH"))?;

        let session_path = std::env::var("TG_SESSION_PATH")
            .map_or_else(|_| default_session_path(), PathBuf::from);

        Ok(Self {
            api_id,
            api_hash,
            bot_token,
            session_path,
        })
    }
}

// The bot token is a credential, keep it out of logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_id", &self.api_id)
            .field("session_path", &self.session_path)
            .finish_non_exhaustive()
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// User id allowed to run `/setup` and upload songs.
    #[serde(default = "default_owner_id")]
    pub owner_id: i64,

    /// Directory where uploads are downloaded for tag extraction.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Minimum interval between messages sent to the same chat in milliseconds.
    #[serde(default = "default_min_send_interval")]
    pub min_send_interval_ms: u64,
}

const fn default_owner_id() -> i64 {
    BOT_OWNER_ID
}

fn default_download_dir() -> PathBuf {
    std::env::temp_dir()
}

const fn default_min_send_interval() -> u64 {
    1000 // Telegram allows roughly one message per second per chat
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            owner_id: default_owner_id(),
            download_dir: default_download_dir(),
            min_send_interval_ms: default_min_send_interval(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            owner_id: std::env::var("BOT_OWNER_ID")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(default_owner_id),
            download_dir: std::env::var("DOWNLOAD_DIR")
                .map_or_else(|_| default_download_dir(), PathBuf::from),
            min_send_interval_ms: std::env::var("MIN_SEND_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_min_send_interval),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid API ID format (must be a positive integer)")]
    InvalidApiId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::default();
        assert_eq!(settings.owner_id, BOT_OWNER_ID);
        assert_eq!(settings.min_send_interval_ms, 1000);
        assert_eq!(settings.download_dir, std::env::temp_dir());
    }

    #[test]
    fn test_telegram_config_new() {
        let config = TelegramConfig::new(12345, "abc123".to_owned(), "1:token".to_owned());
        assert_eq!(config.api_id, 12345);
        assert_eq!(config.api_hash, "abc123");
        assert_eq!(config.session_path, PathBuf::from("squonk.session"));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let config = TelegramConfig::new(1, "secret_hash".to_owned(), "1:secret".to_owned());
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret"));
    }
}
