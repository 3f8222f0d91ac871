use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatingPolarity {
    ThumbsUp,
    ThumbsDown,
}

impl RatingPolarity {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RatingPolarity::ThumbsUp => "THUMBS_UP",
            RatingPolarity::ThumbsDown => "THUMBS_DOWN",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "THUMBS_UP" => Some(RatingPolarity::ThumbsUp),
            "THUMBS_DOWN" => Some(RatingPolarity::ThumbsDown),
            _ => None,
        }
    }
}

/// A (station, artist, title) triple with its aggregate vote counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    /// None until the song is first persisted.
    pub id: Option<i64>,
    pub station_id: i64,
    pub artist: String,
    pub title: String,
    pub thumbs_up_count: u32,
    pub thumbs_down_count: u32,
    pub created: i64,
    pub updated: i64,
}

impl Song {
    pub fn new(station_id: i64, artist: &str, title: &str, now: i64) -> Self {
        Song {
            id: None,
            station_id,
            artist: artist.to_string(),
            title: title.to_string(),
            thumbs_up_count: 0,
            thumbs_down_count: 0,
            created: now,
            updated: now,
        }
    }

    pub(super) fn add_vote(&mut self, polarity: RatingPolarity) {
        match polarity {
            RatingPolarity::ThumbsUp => self.thumbs_up_count += 1,
            RatingPolarity::ThumbsDown => self.thumbs_down_count += 1,
        }
    }

    pub(super) fn remove_vote(&mut self, polarity: RatingPolarity) {
        match polarity {
            RatingPolarity::ThumbsUp => {
                self.thumbs_up_count = self.thumbs_up_count.saturating_sub(1)
            }
            RatingPolarity::ThumbsDown => {
                self.thumbs_down_count = self.thumbs_down_count.saturating_sub(1)
            }
        }
    }
}

/// One voter's standing vote on one song.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingEvent {
    pub id: Option<i64>,
    pub song_id: i64,
    pub user_id: String,
    pub ip_address: String,
    pub polarity: RatingPolarity,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub station_code: String,
    pub artist: String,
    pub title: String,
    pub user_id: String,
    pub rating_type: RatingPolarity,
    /// Filled in from the connection, never from the request body.
    #[serde(skip)]
    pub ip_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    Created,
    Updated,
    AlreadyRecorded,
}

impl SubmitStatus {
    pub fn message(&self) -> &'static str {
        match self {
            SubmitStatus::Created => "Rating submitted successfully",
            SubmitStatus::Updated => "Rating updated successfully",
            SubmitStatus::AlreadyRecorded => "Rating already submitted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingCounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_id: Option<i64>,
    pub artist: String,
    pub title: String,
    pub thumbs_up_count: u32,
    pub thumbs_down_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<RatingPolarity>,
}

impl RatingCounts {
    pub fn for_song(song: &Song, user_rating: Option<RatingPolarity>) -> Self {
        RatingCounts {
            song_id: song.id,
            artist: song.artist.clone(),
            title: song.title.clone(),
            thumbs_up_count: song.thumbs_up_count,
            thumbs_down_count: song.thumbs_down_count,
            user_rating,
        }
    }

    pub fn unrated(artist: &str, title: &str) -> Self {
        RatingCounts {
            song_id: None,
            artist: artist.to_string(),
            title: title.to_string(),
            thumbs_up_count: 0,
            thumbs_down_count: 0,
            user_rating: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingOutcome {
    pub counts: RatingCounts,
    pub status: SubmitStatus,
}

impl RatingOutcome {
    pub fn message(&self) -> &'static str {
        self.status.message()
    }
}
