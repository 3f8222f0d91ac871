use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Resolved artwork URLs keyed by (artist, title). Entries live until the
/// cache is explicitly cleared.
#[derive(Debug, Default)]
pub struct ArtworkCache {
    entries: RwLock<HashMap<String, String>>,
}

impl ArtworkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(artist: &str, title: &str) -> String {
        // Unit separator, so ("a b", "c") and ("a", "b c") do not collide.
        format!("{}\u{1f}{}", artist, title)
    }

    pub fn get(&self, artist: &str, title: &str) -> Option<String> {
        self.read().get(&Self::key(artist, title)).cloned()
    }

    pub fn insert(&self, artist: &str, title: &str, url: String) {
        self.write().insert(Self::key(artist, title), url);
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Every write is a single map call, a poisoned lock still guards a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
