use thiserror::Error;

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("Rate limit exceeded. Maximum {max_votes} votes per {} allowed per station.", describe_window(.window_secs))]
    RateLimitExceeded { max_votes: u32, window_secs: u64 },

    #[error("Station not found: {0}")]
    StationNotFound(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

fn describe_window(window_secs: &u64) -> String {
    match *window_secs {
        60 => "minute".to_string(),
        3600 => "hour".to_string(),
        86400 => "day".to_string(),
        secs if secs % 3600 == 0 => format!("{} hours", secs / 3600),
        secs => format!("{} seconds", secs),
    }
}
