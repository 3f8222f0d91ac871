use super::cache::ArtworkCache;
use super::itunes::ArtworkSearch;
use crate::metrics::{record_artwork_lookup, set_artwork_cache_size};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_FALLBACK_IMAGE_BASE: &str = "https://dummyimage.com/300x300/FF6B35/ffffff.png";

const LOW_RES_TOKEN: &str = "100x100";
const HIGH_RES_TOKEN: &str = "600x600";

pub struct ArtworkResolver {
    cache: Arc<ArtworkCache>,
    search: Arc<dyn ArtworkSearch>,
    fallback_image_base: String,
}

impl ArtworkResolver {
    pub fn new(
        cache: Arc<ArtworkCache>,
        search: Arc<dyn ArtworkSearch>,
        fallback_image_base: &str,
    ) -> Self {
        Self {
            cache,
            search,
            fallback_image_base: fallback_image_base.to_string(),
        }
    }

    /// Returns an artwork URL for the track. Never fails: lookups that error
    /// or find nothing yield a placeholder image showing the title, and are
    /// not cached.
    pub async fn resolve_artwork(&self, artist: &str, title: &str) -> String {
        if let Some(url) = self.cache.get(artist, title) {
            record_artwork_lookup("hit");
            return url;
        }

        let term = format!("{} {}", artist, title);
        match self.search.search_artwork(&term).await {
            Ok(Some(low_res)) => {
                let url = low_res.replace(LOW_RES_TOKEN, HIGH_RES_TOKEN);
                self.cache.insert(artist, title, url.clone());
                record_artwork_lookup("miss");
                set_artwork_cache_size(self.cache.len());
                debug!("Resolved artwork for '{}': {}", term, url);
                url
            }
            Ok(None) => {
                debug!("No artwork found for '{}'", term);
                record_artwork_lookup("fallback");
                self.fallback_url(title)
            }
            Err(err) => {
                warn!("Artwork lookup for '{}' failed: {}", term, err);
                record_artwork_lookup("fallback");
                self.fallback_url(title)
            }
        }
    }

    pub fn fallback_url(&self, text: &str) -> String {
        format!(
            "{}?text={}",
            self.fallback_image_base,
            urlencoding::encode(text)
        )
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        set_artwork_cache_size(0);
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
