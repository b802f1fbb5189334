//! Command and event types.

use std::fmt;

/// Available bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Show the welcome text.
    Start,

    /// Register a group identifier. The argument may be missing.
    Setup(Option<String>),

    /// Play the current song of the invoking chat.
    Play,
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Accepts `/cmd` and `/cmd@bot_username`. When `bot_username` is known,
    /// commands addressed to another bot are ignored. Returns `None` if the
    /// message is not a known command.
    #[must_use]
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim();
        let body = text.strip_prefix('/')?;

        let (head, args) = match body.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (body, ""),
        };

        let cmd = match head.split_once('@') {
            Some((cmd, target)) => {
                if bot_username.is_some_and(|name| !name.eq_ignore_ascii_case(target)) {
                    return None;
                }
                cmd
            }
            None => head,
        };

        match cmd.to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "setup" => Some(Self::Setup(
                args.split_whitespace().next().map(str::to_owned),
            )),
            "play" => Some(Self::Play),
            _ => None,
        }
    }

    /// Returns the command name as typed by users.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Setup(_) => "setup",
            Self::Play => "play",
        }
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup(Some(id)) => write!(f, "/setup {id}"),
            _ => write!(f, "/{}", self.name()),
        }
    }
}

/// Inline buttons attached to audio messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackControl {
    /// Show the playlist.
    Playlist,

    /// Rotate to the next song.
    Next,
}

impl PlaybackControl {
    /// Buttons in the order they are rendered.
    pub const ALL: [Self; 2] = [Self::Playlist, Self::Next];

    /// Callback payload sent back when the button is pressed.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Playlist => "playlist",
            Self::Next => "next",
        }
    }

    /// Button caption.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Playlist => "▶ Playlist",
            Self::Next => "⏭ Next",
        }
    }

    /// Parses a callback payload. Only exact tokens match.
    #[must_use]
    pub fn from_token(data: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|control| control.token().as_bytes() == data)
    }
}

/// Chat an event was received in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContext {
    /// Registry key of the chat (its dialog id as a string).
    pub key: String,

    /// Whether the chat is a one-to-one conversation with the bot.
    pub is_private: bool,
}

/// A file attached to a message.
#[derive(Debug, Clone)]
pub struct Attachment<F> {
    /// Remote file reference.
    pub file: F,

    /// Original file name, if the service reported one.
    pub file_name: Option<String>,

    /// Stable identifier of the remote file, used to name the local copy.
    pub unique_id: String,
}

/// What an inbound event asks for.
#[derive(Debug, Clone)]
pub enum EventKind<F> {
    Command(BotCommand),
    Upload(Attachment<F>),
    Control(PlaybackControl),
}

/// One inbound event, detached from the transport's update type.
#[derive(Debug, Clone)]
pub struct Inbound<O, F> {
    /// Transport handle used to respond.
    pub origin: O,

    /// Chat the event came from.
    pub chat: ChatContext,

    /// User id of the sender, if known.
    pub sender_id: Option<i64>,

    /// Requested action.
    pub kind: EventKind<F>,
}

/// Why a request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotPrivateChat,
    NotOwner,
    MissingArgument,
    UnsupportedFile,
    UnreadableTags,
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The welcome text was sent.
    Welcomed,

    /// A group was registered.
    Registered { group_id: String },

    /// A song was appended to `groups` playlists.
    Saved { title: String, groups: usize },

    /// A song was sent to the chat.
    Playing { title: String },

    /// The playlist listing was shown.
    Listed { songs: usize },

    /// The chat has no songs.
    Empty,

    /// The request was refused.
    Rejected(Rejection),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Welcomed => write!(f, "welcomed"),
            Self::Registered { group_id } => write!(f, "registered group {group_id}"),
            Self::Saved { title, groups } => write!(f, "saved \"{title}\" to {groups} playlists"),
            Self::Playing { title } => write!(f, "playing \"{title}\""),
            Self::Listed { songs } => write!(f, "listed {songs} songs"),
            Self::Empty => write!(f, "no songs"),
            Self::Rejected(reason) => write!(f, "rejected ({reason:?})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_and_play() {
        assert_eq!(BotCommand::parse("/start", None), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/play", None), Some(BotCommand::Play));
        assert_eq!(BotCommand::parse("  /PLAY  ", None), Some(BotCommand::Play));
    }

    #[test]
    fn test_parse_setup_with_arg() {
        assert_eq!(
            BotCommand::parse("/setup -100123", None),
            Some(BotCommand::Setup(Some("-100123".to_owned())))
        );
        assert_eq!(
            BotCommand::parse("/setup   42   extra", None),
            Some(BotCommand::Setup(Some("42".to_owned())))
        );
    }

    #[test]
    fn test_parse_setup_without_arg() {
        assert_eq!(BotCommand::parse("/setup", None), Some(BotCommand::Setup(None)));
        assert_eq!(BotCommand::parse("/setup   ", None), Some(BotCommand::Setup(None)));
    }

    #[test]
    fn test_parse_addressed_command() {
        assert_eq!(
            BotCommand::parse("/play@SquonkBot", Some("squonkbot")),
            Some(BotCommand::Play)
        );
        assert_eq!(BotCommand::parse("/play@OtherBot", Some("squonkbot")), None);
        assert_eq!(BotCommand::parse("/play@AnyBot", None), Some(BotCommand::Play));
    }

    #[test]
    fn test_parse_non_commands() {
        assert_eq!(BotCommand::parse("play", None), None);
        assert_eq!(BotCommand::parse("/unknown", None), None);
        assert_eq!(BotCommand::parse("", None), None);
    }

    #[test]
    fn test_control_tokens() {
        assert_eq!(PlaybackControl::from_token(b"playlist"), Some(PlaybackControl::Playlist));
        assert_eq!(PlaybackControl::from_token(b"next"), Some(PlaybackControl::Next));
        assert_eq!(PlaybackControl::from_token(b"next "), None);
        assert_eq!(PlaybackControl::from_token(b"Next"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(BotCommand::Setup(Some("42".to_owned())).to_string(), "/setup 42");
        assert_eq!(BotCommand::Setup(None).to_string(), "/setup");
        assert_eq!(BotCommand::Play.to_string(), "/play");
    }
}
