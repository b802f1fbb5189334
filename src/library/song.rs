//! Song catalog entry.

/// Placeholder used for a missing title or artist tag.
pub const UNKNOWN_TAG: &str = "Unknown";

/// One uploaded track.
///
/// `F` is the transport's reference to the remote copy of the file; playback
/// re-sends that reference instead of uploading the bytes again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song<F> {
    /// Track title from the tags.
    pub title: String,

    /// Track artist from the tags.
    pub artist: String,

    /// Remote file reference.
    pub file: F,
}

impl<F> Song<F> {
    /// Creates a song, replacing blank tags with [`UNKNOWN_TAG`].
    pub fn new(title: impl Into<String>, artist: impl Into<String>, file: F) -> Self {
        Self {
            title: or_unknown(title.into()),
            artist: or_unknown(artist.into()),
            file,
        }
    }
}

fn or_unknown(value: String) -> String {
    if value.trim().is_empty() {
        UNKNOWN_TAG.to_owned()
    } else {
        value
    }
}
