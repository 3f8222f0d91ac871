//! Song rating: vote toggling, per-station rate limiting and aggregate counts.

mod engine;
mod error;
mod models;
mod rating_store;

pub use engine::{RatingEngine, RatingPolicy};
pub use error::RatingError;
pub use models::{
    RatingCounts, RatingEvent, RatingOutcome, RatingPolarity, RatingRequest, Song, SubmitStatus,
};
pub use rating_store::{RatingStore, RatingUnitOfWork};
