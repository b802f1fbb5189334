//! Telegram client wrapper for the radio bot.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use grammers_client::media::{Document, Media};
use grammers_client::message::{InputMessage, Message};
use grammers_client::update::{CallbackQuery, Update};
use grammers_client::{
    button, reply_markup, sender, Client, InvocationError, SenderPool, UpdateStream,
    UpdatesConfiguration,
};
use grammers_session::storages::SqliteSession;
use grammers_session::types::{PeerId, PeerKind};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ChatTransport, RateLimiter};
use crate::commands::{Attachment, BotCommand, ChatContext, EventKind, Inbound, PlaybackControl};
use crate::config::TelegramConfig;

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Sign in failed: {0}")]
    SignInFailed(String),

    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("API invocation error: {0}")]
    Invocation(String),
}

impl From<InvocationError> for TelegramError {
    fn from(err: InvocationError) -> Self {
        let err_str = err.to_string();

        // Check for flood wait errors
        if (err_str.contains("FLOOD_WAIT") || err_str.contains("flood"))
            && let Some(seconds) = extract_flood_wait_seconds(&err_str)
        {
            return Self::FloodWait(seconds);
        }

        Self::Invocation(err_str)
    }
}

/// Extracts flood wait seconds from an error message.
fn extract_flood_wait_seconds(err_msg: &str) -> Option<u32> {
    let patterns = ["flood_wait_", "flood wait "];
    // ASCII lowercasing keeps byte offsets valid for slicing `err_msg`.
    let lowered = err_msg.to_ascii_lowercase();

    for pattern in patterns {
        if let Some(idx) = lowered.find(pattern) {
            let start = idx + pattern.len();
            let num_str: String = err_msg[start..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(seconds) = num_str.parse() {
                return Some(seconds);
            }
        }
    }
    None
}

/// Where a response goes: the chat of a message, or a pressed button.
pub struct Origin {
    /// Registry key of the chat, also used for rate limiting.
    chat_key: String,

    source: Source,
}

enum Source {
    Message(Message),
    Callback {
        query: CallbackQuery,
        /// The message carrying the pressed button.
        message: Message,
    },
}

impl Origin {
    /// Message responses are posted next to.
    fn message(&self) -> &Message {
        match &self.source {
            Source::Message(message) | Source::Callback { message, .. } => message,
        }
    }
}

/// High-level Telegram bot client.
pub struct TelegramBot {
    /// The underlying grammers client.
    client: Client,

    /// Handle to the sender pool for disconnection.
    handle: sender::SenderPoolHandle,

    /// Per-chat send throttling.
    rate_limiter: RateLimiter,

    /// Bot username, used to filter `/cmd@other_bot` commands.
    username: Option<String>,

    /// Background task running the sender pool.
    _pool_task: JoinHandle<()>,
}

impl TelegramBot {
    /// Connects to Telegram, signs in as a bot and starts the update stream.
    ///
    /// # Errors
    ///
    /// Returns an error if connection or sign in fails.
    pub async fn connect(
        config: &TelegramConfig,
        min_send_interval_ms: u64,
    ) -> Result<(Self, UpdateStream), TelegramError> {
        info!("Connecting to Telegram...");

        let session = Arc::new(
            SqliteSession::open(&config.session_path)
                .await
                .map_err(|e| TelegramError::Session(e.to_string()))?,
        );

        let SenderPool {
            runner,
            updates,
            handle,
        } = SenderPool::new(Arc::clone(&session), config.api_id);

        let client = Client::new(handle.clone());

        // Spawn the sender pool runner
        let pool_task = tokio::spawn(async move {
            runner.run().await;
        });

        let is_authorized = client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        if is_authorized {
            debug!("Reusing session from {}", config.session_path.display());
        } else {
            info!("Signing in as bot...");
            client
                .bot_sign_in(&config.bot_token, &config.api_hash)
                .await
                .map_err(|e| TelegramError::SignInFailed(e.to_string()))?;
        }

        let me = client.get_me().await?;
        let username = me.username().map(str::to_owned);
        info!(
            "Connected to Telegram as @{}",
            username.as_deref().unwrap_or("<no username>")
        );

        let stream = client
            .stream_updates(
                updates,
                UpdatesConfiguration {
                    catch_up: false,
                    ..Default::default()
                },
            )
            .await;

        Ok((
            Self {
                client,
                handle: handle.thin,
                rate_limiter: RateLimiter::from_millis(min_send_interval_ms),
                username,
                _pool_task: pool_task,
            },
            stream,
        ))
    }

    /// Converts an update into an event for the command handler.
    ///
    /// Returns `None` for updates the bot does not react to.
    ///
    /// # Errors
    ///
    /// Returns an error if the message behind a button press cannot be loaded.
    pub async fn to_inbound(
        &self,
        update: Update,
    ) -> Result<Option<Inbound<Origin, Media>>, TelegramError> {
        match update {
            Update::NewMessage(message) if !message.outgoing() => Ok(self.message_event(message)),
            Update::CallbackQuery(query) => self.callback_event(query).await,
            _ => Ok(None),
        }
    }

    fn message_event(&self, message: Message) -> Option<Inbound<Origin, Media>> {
        // Captions on uploads are not treated as commands.
        let kind = if let Some(Media::Document(document)) = message.media() {
            EventKind::Upload(Attachment {
                file_name: document_name(&document),
                unique_id: document.id().to_string(),
                file: Media::Document(document),
            })
        } else {
            EventKind::Command(BotCommand::parse(message.text(), self.username.as_deref())?)
        };

        let chat = chat_context(message.peer_id());
        let sender_id = message.sender_id().map(|id| id.bare_id());

        Some(Inbound {
            origin: Origin {
                chat_key: chat.key.clone(),
                source: Source::Message(message),
            },
            chat,
            sender_id,
            kind,
        })
    }

    async fn callback_event(
        &self,
        query: CallbackQuery,
    ) -> Result<Option<Inbound<Origin, Media>>, TelegramError> {
        let Some(control) = PlaybackControl::from_token(query.data()) else {
            debug!("Ignoring unknown callback payload {:?}", query.data());
            return Ok(None);
        };

        let message = query.load_message().await?;
        let chat = chat_context(message.peer_id());

        Ok(Some(Inbound {
            origin: Origin {
                chat_key: chat.key.clone(),
                source: Source::Callback { query, message },
            },
            chat,
            sender_id: None,
            kind: EventKind::Control(control),
        }))
    }

    /// Waits for the chat's send slot.
    async fn throttle(&self, origin: &Origin) {
        let waited = self.rate_limiter.wait_and_acquire(&origin.chat_key).await;
        if !waited.is_zero() {
            debug!("Waited {:?} before sending to {}", waited, origin.chat_key);
        }
    }

    /// Converts a send result, backing off on flood waits.
    async fn settle<T>(
        &self,
        origin: &Origin,
        result: Result<T, InvocationError>,
    ) -> Result<(), TelegramError> {
        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let err: TelegramError = e.into();
                if let TelegramError::FloodWait(seconds) = &err {
                    self.rate_limiter
                        .handle_flood_wait(&origin.chat_key, *seconds)
                        .await;
                }
                Err(err)
            }
        }
    }

    /// Disconnects from Telegram.
    pub fn disconnect(&self) {
        info!("Disconnecting from Telegram...");
        self.handle.quit();
    }
}

#[async_trait]
impl ChatTransport for TelegramBot {
    type Origin = Origin;
    type File = Media;

    async fn send_text(&self, origin: &Origin, text: &str) -> Result<(), TelegramError> {
        self.throttle(origin).await;
        let result = origin.message().respond(InputMessage::text(text)).await;
        self.settle(origin, result).await
    }

    async fn send_audio(
        &self,
        origin: &Origin,
        file: &Media,
        caption: &str,
        controls: &[PlaybackControl],
    ) -> Result<(), TelegramError> {
        self.throttle(origin).await;
        let message = InputMessage::text(caption)
            .copy_media(file)
            .reply_markup(&controls_markup(controls));
        let result = origin.message().respond(message).await;
        self.settle(origin, result).await
    }

    async fn edit_text(&self, origin: &Origin, text: &str) -> Result<(), TelegramError> {
        let result = match &origin.source {
            Source::Callback { query, .. } => query.answer().edit(InputMessage::text(text)).await,
            Source::Message(message) => message.edit(InputMessage::text(text)).await,
        };
        self.settle(origin, result).await
    }

    async fn acknowledge(&self, origin: &Origin, notice: Option<&str>) -> Result<(), TelegramError> {
        let Source::Callback { query, .. } = &origin.source else {
            return Ok(());
        };

        let answer = match notice {
            Some(text) => query.answer().text(text),
            None => query.answer(),
        };
        let result = answer.send().await;
        self.settle(origin, result).await
    }

    async fn download(&self, file: &Media, dest: &Path) -> Result<(), TelegramError> {
        debug!("Downloading media to {}", dest.display());
        self.client
            .download_media(file, dest)
            .await
            .map_err(|e| TelegramError::Download(e.to_string()))
    }
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot")
            .field("username", &self.username)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Origin")
            .field("chat_key", &self.chat_key)
            .finish_non_exhaustive()
    }
}

/// Builds one row of inline buttons.
fn controls_markup(controls: &[PlaybackControl]) -> reply_markup::Inline {
    reply_markup::inline(vec![
        controls
            .iter()
            .map(|control| button::inline(control.label(), control.token().as_bytes()))
            .collect(),
    ])
}

/// Registry key and kind of a chat. Keys use the Bot API dialog id format
/// (`-100…` for supergroups) so they match ids users copy from other clients.
fn chat_context(peer: PeerId) -> ChatContext {
    ChatContext {
        key: peer.bot_api_dialog_id().to_string(),
        is_private: matches!(peer.kind(), PeerKind::User | PeerKind::UserSelf),
    }
}

/// File name reported for a document, if any.
fn document_name(document: &Document) -> Option<String> {
    let name = document.name();
    (!name.is_empty()).then(|| name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_flood_wait() {
        assert_eq!(extract_flood_wait_seconds("FLOOD_WAIT_120"), Some(120));
        assert_eq!(extract_flood_wait_seconds("flood wait 60 seconds"), Some(60));
        assert_eq!(extract_flood_wait_seconds("some other error"), None);
    }

    #[test]
    fn test_extract_flood_wait_without_number() {
        assert_eq!(extract_flood_wait_seconds("FLOOD_WAIT_"), None);
    }

    #[test]
    fn test_extract_flood_wait_after_non_ascii() {
        assert_eq!(extract_flood_wait_seconds("İflood wait 12"), Some(12));
        assert_eq!(extract_flood_wait_seconds("ÄÖ FLOOD_WAIT_30"), Some(30));
        assert_eq!(extract_flood_wait_seconds("İflood wait ééé"), None);
    }
}
