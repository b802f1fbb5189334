//! In-memory song library.
//!
//! Every registered group owns one [`Playlist`]; the [`Registry`] maps group
//! identifiers to playlists and lives for the lifetime of the process.

mod registry;
mod song;

pub use registry::{Playlist, Registry, SharedRegistry};
pub use song::{Song, UNKNOWN_TAG};
