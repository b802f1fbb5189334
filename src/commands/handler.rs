//! Command handler implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::{
    Attachment, BotCommand, ChatContext, EventKind, Inbound, Outcome, PlaybackControl, Rejection,
};
use crate::config::BotSettings;
use crate::library::{SharedRegistry, Song};
use crate::metadata::{is_mp3_file_name, TagReader};
use crate::telegram::{ChatTransport, TelegramError};

const WELCOME: &str = "👋 Welcome to Squonk Radio V0.4.3!\nUse /setup to link your group.";
const SETUP_PRIVATE_ONLY: &str = "⚠️ Please use this command in private chat.";
const SETUP_NOT_OWNER: &str = "❌ Only the owner can setup groups.";
const SETUP_USAGE: &str = "📥 Send me `/setup <your_group_id>` to register a group.";
const UPLOAD_NOT_OWNER: &str = "❌ Only the bot owner can upload songs.";
const UPLOAD_UNSUPPORTED: &str = "⚠️ Only .mp3 files are supported.";
const UPLOAD_UNREADABLE: &str = "⚠️ Could not read tags from this file.";
const PLAY_NO_SONGS: &str = "❌ No songs found for this group.";
const PLAY_CAPTION: &str = "🎵 Squonking time!";
const PLAYLIST_NO_SONGS: &str = "No songs found.";
const PLAYLIST_HEADER: &str = "🎵 Playlist:";
const NEXT_NO_SONGS: &str = "❌ No songs to play.";
const NEXT_CAPTION: &str = "🎶 Next up!";

/// Errors that abort the handling of a single event.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Transport error: {0}")]
    Transport(#[from] TelegramError),

    #[error("Tag reader task failed: {0}")]
    TagTask(#[from] tokio::task::JoinError),
}

/// Handles inbound events against the shared group registry.
pub struct RadioHandler<T: ChatTransport, R: TagReader + 'static> {
    /// Outgoing side of the chat service.
    transport: Arc<T>,

    /// Reads title/artist from downloaded uploads.
    tags: Arc<R>,

    /// Group playlists.
    registry: SharedRegistry<T::File>,

    /// The only user allowed to register groups and upload.
    owner_id: i64,

    /// Where uploads are stored while their tags are read.
    download_dir: PathBuf,
}

impl<T: ChatTransport, R: TagReader + 'static> RadioHandler<T, R> {
    /// Creates a new handler.
    #[must_use]
    pub fn new(
        transport: Arc<T>,
        tags: R,
        registry: SharedRegistry<T::File>,
        settings: &BotSettings,
    ) -> Self {
        Self {
            transport,
            tags: Arc::new(tags),
            registry,
            owner_id: settings.owner_id,
            download_dir: settings.download_dir.clone(),
        }
    }

    /// Handles one inbound event to completion.
    pub async fn handle(&self, event: Inbound<T::Origin, T::File>) -> Result<Outcome, HandlerError> {
        let Inbound {
            origin,
            chat,
            sender_id,
            kind,
        } = event;

        if let EventKind::Command(command) = &kind {
            debug!("Handling command {} in chat {}", command, chat.key);
        }

        let outcome = match kind {
            EventKind::Command(BotCommand::Start) => self.start(&origin).await?,
            EventKind::Command(BotCommand::Setup(group_id)) => {
                self.setup(&origin, &chat, sender_id, group_id).await?
            }
            EventKind::Command(BotCommand::Play) => self.play(&origin, &chat.key).await?,
            EventKind::Upload(attachment) => self.upload(&origin, sender_id, attachment).await?,
            EventKind::Control(PlaybackControl::Playlist) => {
                self.show_playlist(&origin, &chat.key).await?
            }
            EventKind::Control(PlaybackControl::Next) => self.next(&origin, &chat.key).await?,
        };

        info!("Chat {}: {}", chat.key, outcome);
        Ok(outcome)
    }

    async fn start(&self, origin: &T::Origin) -> Result<Outcome, HandlerError> {
        self.transport.send_text(origin, WELCOME).await?;
        Ok(Outcome::Welcomed)
    }

    async fn setup(
        &self,
        origin: &T::Origin,
        chat: &ChatContext,
        sender_id: Option<i64>,
        group_id: Option<String>,
    ) -> Result<Outcome, HandlerError> {
        if !chat.is_private {
            return self.reject(origin, SETUP_PRIVATE_ONLY, Rejection::NotPrivateChat).await;
        }
        if !self.is_owner(sender_id) {
            return self.reject(origin, SETUP_NOT_OWNER, Rejection::NotOwner).await;
        }
        let Some(group_id) = group_id else {
            return self.reject(origin, SETUP_USAGE, Rejection::MissingArgument).await;
        };

        let replaced = self.registry.write().await.register(group_id.clone());
        if let Some(discarded) = replaced {
            warn!(
                "Group {} registered again, discarded {} songs",
                group_id, discarded
            );
        }

        self.transport
            .send_text(
                origin,
                &format!("✅ Group ID `{group_id}` saved. Now send me .mp3 files!"),
            )
            .await?;

        Ok(Outcome::Registered { group_id })
    }

    async fn upload(
        &self,
        origin: &T::Origin,
        sender_id: Option<i64>,
        attachment: Attachment<T::File>,
    ) -> Result<Outcome, HandlerError> {
        if !self.is_owner(sender_id) {
            return self.reject(origin, UPLOAD_NOT_OWNER, Rejection::NotOwner).await;
        }
        if !is_mp3_file_name(attachment.file_name.as_deref()) {
            debug!("Rejecting upload {:?}", attachment.file_name);
            return self.reject(origin, UPLOAD_UNSUPPORTED, Rejection::UnsupportedFile).await;
        }

        let scratch = ScratchFile::new(
            self.download_dir
                .join(format!("{}.mp3", sanitize_file_stem(&attachment.unique_id))),
        );
        self.transport
            .download(&attachment.file, scratch.path())
            .await?;

        // lofty parses the file synchronously.
        let reader = Arc::clone(&self.tags);
        let path = scratch.path().to_path_buf();
        let tags = tokio::task::spawn_blocking(move || reader.read(&path)).await?;
        drop(scratch);

        let tags = match tags {
            Ok(tags) => tags,
            Err(e) => {
                warn!("Failed to read tags of {}: {}", attachment.unique_id, e);
                return self.reject(origin, UPLOAD_UNREADABLE, Rejection::UnreadableTags).await;
            }
        };

        let song = Song::new(tags.title, tags.artist, attachment.file);
        let reply = format!("✅ Saved `{}` by `{}`.", song.title, song.artist);
        let title = song.title.clone();

        let groups = self.registry.write().await.broadcast(song);
        debug!("Appended \"{}\" to {} playlists", truncate(&title, 40), groups);

        self.transport.send_text(origin, &reply).await?;
        Ok(Outcome::Saved { title, groups })
    }

    async fn play(&self, origin: &T::Origin, group_id: &str) -> Result<Outcome, HandlerError> {
        let head = self.registry.read().await.now_playing(group_id);

        let Some(song) = head else {
            self.transport.send_text(origin, PLAY_NO_SONGS).await?;
            return Ok(Outcome::Empty);
        };

        self.transport
            .send_audio(origin, &song.file, PLAY_CAPTION, &PlaybackControl::ALL)
            .await?;

        Ok(Outcome::Playing {
            title: song.title.clone(),
        })
    }

    async fn show_playlist(
        &self,
        origin: &T::Origin,
        group_id: &str,
    ) -> Result<Outcome, HandlerError> {
        let listing = {
            let registry = self.registry.read().await;
            registry
                .listing(group_id)
                .zip(registry.playlist(group_id).map(|p| p.len()))
        };

        let Some((listing, songs)) = listing else {
            self.transport
                .acknowledge(origin, Some(PLAYLIST_NO_SONGS))
                .await?;
            return Ok(Outcome::Empty);
        };

        self.transport
            .edit_text(origin, &format!("{PLAYLIST_HEADER}\n{listing}"))
            .await?;

        Ok(Outcome::Listed { songs })
    }

    async fn next(&self, origin: &T::Origin, group_id: &str) -> Result<Outcome, HandlerError> {
        let head = self.registry.write().await.advance(group_id);

        let Some(song) = head else {
            self.transport.acknowledge(origin, Some(NEXT_NO_SONGS)).await?;
            return Ok(Outcome::Empty);
        };

        self.transport
            .send_audio(origin, &song.file, NEXT_CAPTION, &PlaybackControl::ALL)
            .await?;
        self.transport.acknowledge(origin, None).await?;

        Ok(Outcome::Playing {
            title: song.title.clone(),
        })
    }

    fn is_owner(&self, sender_id: Option<i64>) -> bool {
        sender_id == Some(self.owner_id)
    }

    async fn reject(
        &self,
        origin: &T::Origin,
        text: &str,
        reason: Rejection,
    ) -> Result<Outcome, HandlerError> {
        self.transport.send_text(origin, text).await?;
        Ok(Outcome::Rejected(reason))
    }
}

/// Local copy of an upload, removed when dropped.
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Keeps only characters that are safe in a file name.
fn sanitize_file_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if stem.is_empty() {
        "upload".to_owned()
    } else {
        stem
    }
}

/// Truncates a string to a maximum length, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
