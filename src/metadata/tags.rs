//! Title/artist readers backed by `lofty`.

use std::path::Path;

use lofty::file::TaggedFileExt;
use lofty::prelude::Accessor;
use lofty::tag::Tag;
use thiserror::Error;
use tracing::debug;

use crate::library::UNKNOWN_TAG;

/// File name suffix accepted for uploads.
const MP3_SUFFIX: &str = ".mp3";

/// Errors that can occur while reading tags.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read tags: {0}")]
    Unreadable(String),
}

/// Display metadata of one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
}

impl Default for TrackTags {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TAG.to_owned(),
            artist: UNKNOWN_TAG.to_owned(),
        }
    }
}

/// Reads display metadata from a local audio file.
///
/// Reads are blocking file I/O; async callers run them on the blocking pool.
pub trait TagReader: Send + Sync {
    /// Reads title and artist, each falling back to [`UNKNOWN_TAG`].
    fn read(&self, path: &Path) -> Result<TrackTags, MetadataError>;
}

/// Tag reader using the lofty library.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

impl LoftyTagReader {
    /// Creates a new tag reader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Returns the first non-blank value found in the primary tag, then the rest.
fn first_non_empty<E>(primary: Option<&Tag>, tags: &[Tag], extractor: E) -> Option<String>
where
    E: Fn(&Tag) -> Option<String>,
{
    primary
        .into_iter()
        .chain(tags)
        .filter_map(extractor)
        .map(|value| value.trim().to_owned())
        .find(|value| !value.is_empty())
}

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> Result<TrackTags, MetadataError> {
        if !path.exists() {
            return Err(MetadataError::FileNotFound(path.display().to_string()));
        }

        let tagged_file =
            lofty::read_from_path(path).map_err(|e| MetadataError::Unreadable(e.to_string()))?;

        let primary = tagged_file.primary_tag();
        let tags = tagged_file.tags();

        let title = first_non_empty(primary, tags, |tag| tag.title().map(|v| v.into_owned()));
        let artist = first_non_empty(primary, tags, |tag| tag.artist().map(|v| v.into_owned()));

        debug!(
            "Read tags from {}: title={:?}, artist={:?}",
            path.display(),
            title,
            artist
        );

        let defaults = TrackTags::default();
        Ok(TrackTags {
            title: title.unwrap_or(defaults.title),
            artist: artist.unwrap_or(defaults.artist),
        })
    }
}

/// Returns true if the attachment name has the literal `.mp3` suffix.
#[must_use]
pub fn is_mp3_file_name(name: Option<&str>) -> bool {
    name.is_some_and(|n| n.ends_with(MP3_SUFFIX))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use lofty::config::WriteOptions;
    use lofty::prelude::TagExt;
    use lofty::tag::TagType;
    use tempfile::TempDir;

    use super::*;

    /// MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, no padding: 417 byte frames.
    const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];
    const FRAME_LEN: usize = 417;

    /// Writes an untagged MP3 made of silent frames.
    fn write_silent_mp3(dir: &TempDir, name: &str) -> PathBuf {
        let mut bytes = Vec::with_capacity(FRAME_LEN * 20);
        for _ in 0..20 {
            bytes.extend_from_slice(&FRAME_HEADER);
            bytes.resize(bytes.len() + FRAME_LEN - FRAME_HEADER.len(), 0);
        }
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn save_tag(path: &Path, tag_type: TagType, title: &str, artist: Option<&str>) {
        let mut tag = Tag::new(tag_type);
        tag.set_title(title.to_owned());
        if let Some(artist) = artist {
            tag.set_artist(artist.to_owned());
        }
        tag.save_to_path(path, WriteOptions::default()).unwrap();
    }

    #[test]
    fn test_mp3_suffix() {
        assert!(is_mp3_file_name(Some("song.mp3")));
        assert!(is_mp3_file_name(Some(".mp3")));
        assert!(!is_mp3_file_name(Some("song.MP3")));
        assert!(!is_mp3_file_name(Some("song.ogg")));
        assert!(!is_mp3_file_name(Some("song.mp3.zip")));
        assert!(!is_mp3_file_name(None));
    }

    #[test]
    fn test_default_tags_are_unknown() {
        let tags = TrackTags::default();
        assert_eq!(tags.title, "Unknown");
        assert_eq!(tags.artist, "Unknown");
    }

    #[test]
    fn test_read_nonexistent_file_returns_error() {
        let reader = LoftyTagReader::new();
        let result = reader.read(Path::new("/definitely/not/here.mp3"));
        assert!(matches!(result, Err(MetadataError::FileNotFound(_))));
    }

    #[test]
    fn test_read_id3v2_title_and_artist() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_silent_mp3(&dir, "alpha.mp3");
        save_tag(&path, TagType::Id3v2, "  Alpha ", Some("X  "));

        let tags = LoftyTagReader::new().read(&path).unwrap();

        assert_eq!(
            tags,
            TrackTags {
                title: "Alpha".to_owned(),
                artist: "X".to_owned(),
            }
        );
    }

    #[test]
    fn test_read_falls_back_to_secondary_tag() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_silent_mp3(&dir, "beta.mp3");
        save_tag(&path, TagType::Id3v2, "   ", Some("Y"));
        save_tag(&path, TagType::Id3v1, "Beta", None);

        let tags = LoftyTagReader::new().read(&path).unwrap();

        assert_eq!(tags.title, "Beta");
        assert_eq!(tags.artist, "Y");
    }

    #[test]
    fn test_read_untagged_file_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_silent_mp3(&dir, "bare.mp3");

        let tags = LoftyTagReader::new().read(&path).unwrap();

        assert_eq!(tags, TrackTags::default());
    }

    #[test]
    fn test_read_missing_artist_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_silent_mp3(&dir, "gamma.mp3");
        save_tag(&path, TagType::Id3v2, "Gamma", None);

        let tags = LoftyTagReader::new().read(&path).unwrap();

        assert_eq!(tags.title, "Gamma");
        assert_eq!(tags.artist, UNKNOWN_TAG);
    }

    #[test]
    fn test_read_corrupt_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"definitely not an mpeg stream".repeat(16)).unwrap();

        let result = LoftyTagReader::new().read(&path);

        assert!(matches!(result, Err(MetadataError::Unreadable(_))));
    }
}
