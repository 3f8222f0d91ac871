//! Album artwork lookup with an in-process cache and a placeholder fallback.

mod cache;
mod itunes;
mod resolver;

pub use cache::ArtworkCache;
pub use itunes::{ArtworkSearch, ArtworkSearchError, ItunesSearchClient, ITUNES_SEARCH_URL};
pub use resolver::{ArtworkResolver, DEFAULT_FALLBACK_IMAGE_BASE};
