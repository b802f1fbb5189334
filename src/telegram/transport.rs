//! Chat transport abstraction used by the command handler.

use std::path::Path;

use async_trait::async_trait;

use super::TelegramError;
use crate::commands::PlaybackControl;

/// Outgoing side of the chat service.
///
/// `Origin` identifies the event being answered: every response goes back to
/// the chat (and, for button presses, the message) the event came from.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Handle of the event a response belongs to.
    type Origin: Send + Sync;

    /// Reference to a file already stored by the chat service.
    type File: Clone + Send + Sync;

    /// Sends a plain text message to the origin chat.
    async fn send_text(&self, origin: &Self::Origin, text: &str) -> Result<(), TelegramError>;

    /// Sends a stored audio file with a caption and inline controls.
    async fn send_audio(
        &self,
        origin: &Self::Origin,
        file: &Self::File,
        caption: &str,
        controls: &[PlaybackControl],
    ) -> Result<(), TelegramError>;

    /// Replaces the text of the message whose button was pressed.
    async fn edit_text(&self, origin: &Self::Origin, text: &str) -> Result<(), TelegramError>;

    /// Acknowledges a button press, optionally with a short notice.
    async fn acknowledge(
        &self,
        origin: &Self::Origin,
        notice: Option<&str>,
    ) -> Result<(), TelegramError>;

    /// Downloads a stored file to a local path.
    async fn download(&self, file: &Self::File, dest: &Path) -> Result<(), TelegramError>;
}
