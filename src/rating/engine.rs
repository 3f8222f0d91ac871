use super::error::RatingError;
use super::models::{
    RatingCounts, RatingEvent, RatingOutcome, RatingRequest, Song, SubmitStatus,
};
use super::rating_store::{RatingStore, RatingUnitOfWork};
use crate::station::Station;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Limits how many new votes a single address may cast on one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingPolicy {
    pub max_votes_per_window: u32,
    pub window_secs: u64,
}

impl Default for RatingPolicy {
    fn default() -> Self {
        RatingPolicy {
            max_votes_per_window: 20,
            window_secs: 3600,
        }
    }
}

pub struct RatingEngine {
    store: Arc<dyn RatingStore>,
    policy: RatingPolicy,
}

impl RatingEngine {
    pub fn new(store: Arc<dyn RatingStore>, policy: RatingPolicy) -> Self {
        RatingEngine { store, policy }
    }

    pub fn policy(&self) -> RatingPolicy {
        self.policy
    }

    /// Records a vote. Repeating a vote is a no-op, casting the opposite one
    /// moves the voter's single vote to the other side.
    pub fn submit_rating(&self, request: &RatingRequest) -> Result<RatingOutcome, RatingError> {
        let now = chrono::Utc::now().timestamp();
        let mut uow = self.store.begin()?;

        let station = resolve_station(&*uow, &request.station_code)?;
        self.check_rate_limit(&*uow, &station, &request.ip_address, now)?;

        let mut song = match uow.find_song(station.id, &request.artist, &request.title)? {
            Some(song) => song,
            None => {
                debug!(
                    "First vote for '{}' by '{}' on {}",
                    request.title, request.artist, station.code
                );
                uow.save_song(Song::new(station.id, &request.artist, &request.title, now))?
            }
        };
        let song_id = song_id(&song)?;

        let status = match uow.find_rating_event(song_id, &request.user_id)? {
            Some(event) if event.polarity == request.rating_type => SubmitStatus::AlreadyRecorded,
            Some(mut event) => {
                song.remove_vote(event.polarity);
                song.add_vote(request.rating_type);
                song.updated = now;
                event.polarity = request.rating_type;
                event.ip_address = request.ip_address.clone();
                event.updated = now;
                uow.save_rating_event(event)?;
                song = uow.save_song(song)?;
                SubmitStatus::Updated
            }
            None => {
                uow.save_rating_event(RatingEvent {
                    id: None,
                    song_id,
                    user_id: request.user_id.clone(),
                    ip_address: request.ip_address.clone(),
                    polarity: request.rating_type,
                    created: now,
                    updated: now,
                })?;
                song.add_vote(request.rating_type);
                song.updated = now;
                song = uow.save_song(song)?;
                SubmitStatus::Created
            }
        };

        uow.commit()?;

        info!(
            "Rating {:?} on song {} ({} / {}): {:?}",
            request.rating_type, song_id, song.artist, song.title, status
        );

        Ok(RatingOutcome {
            counts: RatingCounts::for_song(&song, Some(request.rating_type)),
            status,
        })
    }

    /// Current counts for a song, plus the given voter's vote when known.
    /// A song nobody voted on yet has zero counts.
    pub fn get_counts(
        &self,
        station_code: &str,
        artist: &str,
        title: &str,
        user_id: Option<&str>,
    ) -> Result<RatingCounts, RatingError> {
        let uow = self.store.begin()?;
        let station = resolve_station(&*uow, station_code)?;

        let Some(song) = uow.find_song(station.id, artist, title)? else {
            return Ok(RatingCounts::unrated(artist, title));
        };

        let user_rating = match user_id.filter(|id| !id.is_empty()) {
            Some(user_id) => uow
                .find_rating_event(song_id(&song)?, user_id)?
                .map(|event| event.polarity),
            None => None,
        };

        Ok(RatingCounts::for_song(&song, user_rating))
    }

    fn check_rate_limit(
        &self,
        uow: &dyn RatingUnitOfWork,
        station: &Station,
        ip_address: &str,
        now: i64,
    ) -> Result<(), RatingError> {
        if ip_address.is_empty() {
            return Ok(());
        }
        let since = now - self.policy.window_secs as i64;
        let recent = uow.count_rating_events_by_origin_since(station.id, ip_address, since)?;
        if recent >= self.policy.max_votes_per_window as u64 {
            warn!(
                "Rate limit hit for {} on station {} ({} votes)",
                ip_address, station.code, recent
            );
            return Err(RatingError::RateLimitExceeded {
                max_votes: self.policy.max_votes_per_window,
                window_secs: self.policy.window_secs,
            });
        }
        Ok(())
    }
}

fn resolve_station(uow: &dyn RatingUnitOfWork, code: &str) -> Result<Station, RatingError> {
    uow.resolve_station(code)?
        .ok_or_else(|| RatingError::StationNotFound(code.to_string()))
}

fn song_id(song: &Song) -> Result<i64, RatingError> {
    song.id
        .ok_or_else(|| RatingError::Storage(anyhow::anyhow!("Stored song has no id")))
}
