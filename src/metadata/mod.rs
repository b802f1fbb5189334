//! Audio tag extraction.

mod tags;

pub use tags::{is_mp3_file_name, LoftyTagReader, MetadataError, TagReader, TrackTags};
