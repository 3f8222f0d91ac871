use super::schema::RADIO_VERSIONED_SCHEMAS;
use crate::rating::{RatingEvent, RatingPolarity, RatingStore, RatingUnitOfWork, Song};
use crate::sqlite_persistence::open_versioned_db;
use crate::station::{Station, StationSeed, StationStore};
use anyhow::{anyhow, bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

const STATION_COLUMNS: &str = "id, code, name, stream_url, metadata_url, upstream_metadata_url, \
    is_active, display_order, stream_format, stream_quality, stream_codec, stream_bitrate, \
    genre, tagline, logo_url, description, source_info, created, updated";

const SONG_COLUMNS: &str =
    "id, station_id, artist, title, thumbs_up_count, thumbs_down_count, created, updated";

const RATING_COLUMNS: &str = "id, song_id, user_id, ip_address, rating_type, created, updated";

#[derive(Clone)]
pub struct SqliteRadioStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRadioStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path, RADIO_VERSIONED_SCHEMAS, "radio")?;
        Ok(SqliteRadioStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = crate::sqlite_persistence::open_in_memory_db(RADIO_VERSIONED_SCHEMAS)?;
        Ok(SqliteRadioStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Radio database mutex poisoned"))
    }

    fn query_stations(&self, active_only: bool) -> Result<Vec<Station>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM station {} ORDER BY display_order, id",
            STATION_COLUMNS,
            if active_only { "WHERE is_active = 1" } else { "" }
        );
        let mut stmt = conn.prepare(&sql)?;
        let stations = stmt
            .query_map([], row_to_station)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read stations")?;
        Ok(stations)
    }

    /// (song id, thumbs up, thumbs down) for every song.
    #[cfg(test)]
    pub fn song_counts_snapshot(&self) -> Result<Vec<(i64, u32, u32)>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, thumbs_up_count, thumbs_down_count FROM song ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Number of up and down rating events referencing the song.
    #[cfg(test)]
    pub fn event_polarity_totals(&self, song_id: i64) -> Result<(u32, u32)> {
        let conn = self.lock()?;
        let count = |polarity: RatingPolarity| -> Result<u32> {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM rating WHERE song_id = ?1 AND rating_type = ?2",
                params![song_id, polarity.to_db_str()],
                |row| row.get(0),
            )?)
        };
        Ok((
            count(RatingPolarity::ThumbsUp)?,
            count(RatingPolarity::ThumbsDown)?,
        ))
    }
}

fn row_to_station(row: &rusqlite::Row) -> rusqlite::Result<Station> {
    Ok(Station {
        id: row.get("id")?,
        code: row.get("code")?,
        name: row.get("name")?,
        stream_url: row.get("stream_url")?,
        metadata_url: row.get("metadata_url")?,
        upstream_metadata_url: row.get("upstream_metadata_url")?,
        is_active: row.get::<_, i32>("is_active")? != 0,
        display_order: row.get("display_order")?,
        stream_format: row.get("stream_format")?,
        stream_quality: row.get("stream_quality")?,
        stream_codec: row.get("stream_codec")?,
        stream_bitrate: row.get("stream_bitrate")?,
        genre: row.get("genre")?,
        tagline: row.get("tagline")?,
        logo_url: row.get("logo_url")?,
        description: row.get("description")?,
        source_info: row.get("source_info")?,
        created: row.get("created")?,
        updated: row.get("updated")?,
    })
}

fn row_to_song(row: &rusqlite::Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: Some(row.get("id")?),
        station_id: row.get("station_id")?,
        artist: row.get("artist")?,
        title: row.get("title")?,
        thumbs_up_count: row.get("thumbs_up_count")?,
        thumbs_down_count: row.get("thumbs_down_count")?,
        created: row.get("created")?,
        updated: row.get("updated")?,
    })
}

fn row_to_rating_event(row: &rusqlite::Row) -> rusqlite::Result<RatingEvent> {
    let raw_polarity: String = row.get("rating_type")?;
    let polarity = RatingPolarity::from_db_str(&raw_polarity).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("Unknown rating type {}", raw_polarity).into(),
        )
    })?;
    Ok(RatingEvent {
        id: Some(row.get("id")?),
        song_id: row.get("song_id")?,
        user_id: row.get("user_id")?,
        ip_address: row.get("ip_address")?,
        polarity,
        created: row.get("created")?,
        updated: row.get("updated")?,
    })
}

fn select_station_by_code(conn: &Connection, code: &str) -> Result<Option<Station>> {
    conn.query_row(
        &format!("SELECT {} FROM station WHERE code = ?1", STATION_COLUMNS),
        params![code],
        row_to_station,
    )
    .optional()
    .with_context(|| format!("Failed to read station {}", code))
}

impl StationStore for SqliteRadioStore {
    fn get_active_stations(&self) -> Result<Vec<Station>> {
        self.query_stations(true)
    }

    fn get_all_stations(&self) -> Result<Vec<Station>> {
        self.query_stations(false)
    }

    fn get_station_by_code(&self, code: &str) -> Result<Option<Station>> {
        let conn = self.lock()?;
        select_station_by_code(&conn, code)
    }

    fn upsert_station(&self, seed: &StationSeed) -> Result<Station> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO station (code, name, stream_url, metadata_url, upstream_metadata_url, \
                 is_active, display_order, stream_format, stream_quality, stream_codec, \
                 stream_bitrate, genre, tagline, logo_url, description, source_info) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16) \
             ON CONFLICT(code) DO UPDATE SET \
                 name = excluded.name, \
                 stream_url = excluded.stream_url, \
                 metadata_url = excluded.metadata_url, \
                 upstream_metadata_url = excluded.upstream_metadata_url, \
                 is_active = excluded.is_active, \
                 display_order = excluded.display_order, \
                 stream_format = excluded.stream_format, \
                 stream_quality = excluded.stream_quality, \
                 stream_codec = excluded.stream_codec, \
                 stream_bitrate = excluded.stream_bitrate, \
                 genre = excluded.genre, \
                 tagline = excluded.tagline, \
                 logo_url = excluded.logo_url, \
                 description = excluded.description, \
                 source_info = excluded.source_info, \
                 updated = cast(strftime('%s','now') as int)",
            params![
                seed.code,
                seed.name,
                seed.stream_url,
                seed.metadata_url,
                seed.upstream_metadata_url,
                seed.is_active,
                seed.display_order,
                seed.stream_format,
                seed.stream_quality,
                seed.stream_codec,
                seed.stream_bitrate,
                seed.genre,
                seed.tagline,
                seed.logo_url,
                seed.description,
                seed.source_info,
            ],
        )
        .with_context(|| format!("Failed to upsert station {}", seed.code))?;

        select_station_by_code(&conn, &seed.code)?
            .with_context(|| format!("Station {} missing after upsert", seed.code))
    }
}

impl RatingStore for SqliteRadioStore {
    fn begin(&self) -> Result<Box<dyn RatingUnitOfWork + '_>> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .context("Failed to begin rating transaction")?;
        Ok(Box::new(SqliteRatingUnitOfWork {
            conn,
            finished: false,
        }))
    }
}

/// Holds the connection lock for its whole lifetime, so units of work never
/// interleave. Rolls back on drop unless committed.
struct SqliteRatingUnitOfWork<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl RatingUnitOfWork for SqliteRatingUnitOfWork<'_> {
    fn resolve_station(&self, code: &str) -> Result<Option<Station>> {
        select_station_by_code(&self.conn, code)
    }

    fn find_song(&self, station_id: i64, artist: &str, title: &str) -> Result<Option<Song>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM song WHERE station_id = ?1 AND artist = ?2 AND title = ?3",
                    SONG_COLUMNS
                ),
                params![station_id, artist, title],
                row_to_song,
            )
            .optional()
            .context("Failed to look up song")
    }

    fn save_song(&mut self, mut song: Song) -> Result<Song> {
        match song.id {
            None => {
                self.conn
                    .execute(
                        "INSERT INTO song (station_id, artist, title, thumbs_up_count, \
                             thumbs_down_count, created, updated) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            song.station_id,
                            song.artist,
                            song.title,
                            song.thumbs_up_count,
                            song.thumbs_down_count,
                            song.created,
                            song.updated,
                        ],
                    )
                    .context("Failed to insert song")?;
                song.id = Some(self.conn.last_insert_rowid());
            }
            Some(id) => {
                let updated = self
                    .conn
                    .execute(
                        "UPDATE song SET thumbs_up_count = ?1, thumbs_down_count = ?2, \
                             updated = ?3 WHERE id = ?4",
                        params![
                            song.thumbs_up_count,
                            song.thumbs_down_count,
                            song.updated,
                            id
                        ],
                    )
                    .context("Failed to update song")?;
                if updated != 1 {
                    bail!("Song {} does not exist", id);
                }
            }
        }
        Ok(song)
    }

    fn find_rating_event(&self, song_id: i64, user_id: &str) -> Result<Option<RatingEvent>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM rating WHERE song_id = ?1 AND user_id = ?2",
                    RATING_COLUMNS
                ),
                params![song_id, user_id],
                row_to_rating_event,
            )
            .optional()
            .context("Failed to look up rating")
    }

    fn save_rating_event(&mut self, mut event: RatingEvent) -> Result<RatingEvent> {
        match event.id {
            None => {
                self.conn
                    .execute(
                        "INSERT INTO rating (song_id, user_id, ip_address, rating_type, \
                             created, updated) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            event.song_id,
                            event.user_id,
                            event.ip_address,
                            event.polarity.to_db_str(),
                            event.created,
                            event.updated,
                        ],
                    )
                    .context("Failed to insert rating")?;
                event.id = Some(self.conn.last_insert_rowid());
            }
            Some(id) => {
                let updated = self
                    .conn
                    .execute(
                        "UPDATE rating SET ip_address = ?1, rating_type = ?2, updated = ?3 \
                         WHERE id = ?4",
                        params![
                            event.ip_address,
                            event.polarity.to_db_str(),
                            event.updated,
                            id
                        ],
                    )
                    .context("Failed to update rating")?;
                if updated != 1 {
                    bail!("Rating {} does not exist", id);
                }
            }
        }
        Ok(event)
    }

    fn count_rating_events_by_origin_since(
        &self,
        station_id: i64,
        ip_address: &str,
        since: i64,
    ) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM rating r JOIN song s ON s.id = r.song_id \
                 WHERE s.station_id = ?1 AND r.ip_address = ?2 AND r.created > ?3",
                params![station_id, ip_address, since],
                |row| row.get(0),
            )
            .context("Failed to count recent ratings")?;
        Ok(count as u64)
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .context("Failed to commit rating transaction")?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteRatingUnitOfWork<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.conn.execute_batch("ROLLBACK") {
            warn!("Failed to roll back rating transaction: {}", err);
        }
    }
}
