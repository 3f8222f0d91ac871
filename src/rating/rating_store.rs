use super::models::{RatingEvent, Song};
use crate::station::Station;
use anyhow::Result;

/// Source of rating units of work.
pub trait RatingStore: Send + Sync {
    /// Starts a unit of work. Everything done through it becomes visible
    /// atomically on `commit`; dropping it without committing discards it.
    /// Units of work are serialized against each other.
    fn begin(&self) -> Result<Box<dyn RatingUnitOfWork + '_>>;
}

pub trait RatingUnitOfWork {
    /// Returns Ok(None) if no station has the given code.
    fn resolve_station(&self, code: &str) -> Result<Option<Station>>;

    /// Returns Ok(None) if the song was never rated on this station.
    fn find_song(&self, station_id: i64, artist: &str, title: &str) -> Result<Option<Song>>;

    /// Inserts the song when it has no id, updates it otherwise.
    /// Returns the song with its id set.
    fn save_song(&mut self, song: Song) -> Result<Song>;

    /// Returns Ok(None) if the voter never rated this song.
    fn find_rating_event(&self, song_id: i64, user_id: &str) -> Result<Option<RatingEvent>>;

    /// Inserts the event when it has no id, updates it otherwise.
    fn save_rating_event(&mut self, event: RatingEvent) -> Result<RatingEvent>;

    /// Counts events created strictly after `since` (unix seconds) from the
    /// given address, for songs of the given station.
    fn count_rating_events_by_origin_since(
        &self,
        station_id: i64,
        ip_address: &str,
        since: i64,
    ) -> Result<u64>;

    fn commit(self: Box<Self>) -> Result<()>;
}
