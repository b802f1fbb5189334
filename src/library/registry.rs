//! Group playlist store.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::Song;

/// Registry shared between the dispatch loop and handlers.
pub type SharedRegistry<F> = Arc<RwLock<Registry<F>>>;

/// Ordered list of songs for one group. The head is the song now playing.
#[derive(Debug, Clone)]
pub struct Playlist<F> {
    songs: VecDeque<Arc<Song<F>>>,
}

impl<F> Default for Playlist<F> {
    fn default() -> Self {
        Self {
            songs: VecDeque::new(),
        }
    }
}

impl<F> Playlist<F> {
    /// Creates an empty playlist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of songs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Returns true if the playlist has no songs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Returns the song now playing.
    #[must_use]
    pub fn head(&self) -> Option<&Arc<Song<F>>> {
        self.songs.front()
    }

    /// Appends a song at the tail.
    pub fn append(&mut self, song: Arc<Song<F>>) {
        self.songs.push_back(song);
    }

    /// Moves the head to the tail and returns the new head.
    ///
    /// With a single song the playlist is unchanged and the same song is
    /// returned.
    pub fn rotate(&mut self) -> Option<&Arc<Song<F>>> {
        if self.songs.is_empty() {
            return None;
        }
        self.songs.rotate_left(1);
        self.songs.front()
    }

    /// Iterates over the songs in play order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Song<F>>> {
        self.songs.iter()
    }

    /// Renders a 1-indexed list of titles in play order.
    #[must_use]
    pub fn listing(&self) -> String {
        self.songs
            .iter()
            .enumerate()
            .map(|(i, song)| format!("{}. {}", i + 1, song.title))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Mapping from group identifier to that group's playlist.
#[derive(Debug)]
pub struct Registry<F> {
    playlists: HashMap<String, Playlist<F>>,
}

impl<F> Default for Registry<F> {
    fn default() -> Self {
        Self {
            playlists: HashMap::new(),
        }
    }
}

impl<F> Registry<F> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry wrapped for sharing.
    #[must_use]
    pub fn shared() -> SharedRegistry<F> {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Registers a group with an empty playlist.
    ///
    /// An existing playlist under the same identifier is replaced. Returns the
    /// number of songs the replaced playlist held, if there was one.
    pub fn register(&mut self, group_id: impl Into<String>) -> Option<usize> {
        self.playlists
            .insert(group_id.into(), Playlist::new())
            .map(|old| old.len())
    }

    /// Returns true if the group is registered.
    #[must_use]
    pub fn contains(&self, group_id: &str) -> bool {
        self.playlists.contains_key(group_id)
    }

    /// Returns the playlist of a group.
    #[must_use]
    pub fn playlist(&self, group_id: &str) -> Option<&Playlist<F>> {
        self.playlists.get(group_id)
    }

    /// Returns the number of registered groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    /// Returns true if no group is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    /// Appends one song to every registered playlist.
    ///
    /// Returns the number of playlists that received it.
    pub fn broadcast(&mut self, song: Song<F>) -> usize {
        let song = Arc::new(song);
        for playlist in self.playlists.values_mut() {
            playlist.append(Arc::clone(&song));
        }
        self.playlists.len()
    }

    /// Returns the song now playing in a group.
    #[must_use]
    pub fn now_playing(&self, group_id: &str) -> Option<Arc<Song<F>>> {
        self.playlist(group_id)?.head().cloned()
    }

    /// Rotates a group's playlist and returns the new head.
    pub fn advance(&mut self, group_id: &str) -> Option<Arc<Song<F>>> {
        self.playlists.get_mut(group_id)?.rotate().cloned()
    }

    /// Returns the numbered title listing of a non-empty playlist.
    #[must_use]
    pub fn listing(&self, group_id: &str) -> Option<String> {
        self.playlist(group_id)
            .filter(|p| !p.is_empty())
            .map(Playlist::listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(title: &str) -> Song<u32> {
        Song::new(title, "X", 0)
    }

    fn titles(registry: &Registry<u32>, group_id: &str) -> Vec<String> {
        registry
            .playlist(group_id)
            .map(|p| p.iter().map(|s| s.title.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_unregistered_group_is_empty_and_untouched() {
        let mut registry = Registry::<u32>::new();
        assert!(registry.now_playing("nope").is_none());
        assert!(registry.listing("nope").is_none());
        assert!(registry.advance("nope").is_none());
        assert!(!registry.contains("nope"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_creates_empty_playlist() {
        let mut registry = Registry::<u32>::new();
        assert_eq!(registry.register("100"), None);
        assert!(registry.playlist("100").is_some_and(Playlist::is_empty));
        assert!(registry.listing("100").is_none());
    }

    #[test]
    fn test_register_twice_discards_songs() {
        let mut registry = Registry::new();
        registry.register("100");
        registry.broadcast(song("Alpha"));
        assert_eq!(registry.register("100"), Some(1));
        assert!(registry.playlist("100").is_some_and(Playlist::is_empty));
    }

    #[test]
    fn test_broadcast_appends_to_every_playlist() {
        let mut registry = Registry::new();
        for id in ["1", "2", "3"] {
            registry.register(id);
        }
        registry.broadcast(song("Alpha"));
        assert_eq!(registry.broadcast(song("Beta")), 3);

        for id in ["1", "2", "3"] {
            assert_eq!(titles(&registry, id), ["Alpha", "Beta"]);
        }
    }

    #[test]
    fn test_broadcast_shares_one_song() {
        let mut registry = Registry::new();
        registry.register("1");
        registry.register("2");
        registry.broadcast(song("Alpha"));

        let a = registry.now_playing("1");
        let b = registry.now_playing("2");
        assert!(matches!((a, b), (Some(a), Some(b)) if Arc::ptr_eq(&a, &b)));
    }

    #[test]
    fn test_broadcast_without_groups() {
        let mut registry = Registry::new();
        assert_eq!(registry.broadcast(song("Alpha")), 0);
    }

    #[test]
    fn test_rotate_is_cyclic() {
        let mut playlist = Playlist::new();
        for title in ["a", "b", "c", "d"] {
            playlist.append(Arc::new(song(title)));
        }
        let original: Vec<_> = playlist.iter().map(|s| s.title.clone()).collect();

        for _ in 0..playlist.len() {
            playlist.rotate();
        }

        let after: Vec<_> = playlist.iter().map(|s| s.title.clone()).collect();
        assert_eq!(original, after);
    }

    #[test]
    fn test_rotate_single_song() {
        let mut playlist = Playlist::new();
        playlist.append(Arc::new(song("solo")));
        assert_eq!(playlist.rotate().map(|s| s.title.as_str()), Some("solo"));
        assert_eq!(playlist.len(), 1);
    }

    #[test]
    fn test_rotate_empty() {
        let mut playlist = Playlist::<u32>::new();
        assert!(playlist.rotate().is_none());
    }

    #[test]
    fn test_advance_and_listing() {
        let mut registry = Registry::new();
        registry.register("100");
        registry.broadcast(song("Alpha"));
        registry.broadcast(song("Beta"));

        let next = registry.advance("100");
        assert_eq!(next.map(|s| s.title.clone()).as_deref(), Some("Beta"));
        assert_eq!(titles(&registry, "100"), ["Beta", "Alpha"]);
        assert_eq!(registry.listing("100").as_deref(), Some("1. Beta\n2. Alpha"));
    }
}
