use axum::extract::FromRef;

use crate::alerts::AlertStore;
use crate::artwork::ArtworkResolver;
use crate::metadata::NowPlayingService;
use crate::rating::RatingEngine;
use crate::station::StationStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedStationStore = Arc<dyn StationStore>;
pub type GuardedRatingEngine = Arc<RatingEngine>;
pub type GuardedArtworkResolver = Arc<ArtworkResolver>;
pub type GuardedNowPlayingService = Arc<NowPlayingService>;
pub type GuardedAlertStore = Arc<dyn AlertStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub station_store: GuardedStationStore,
    pub rating_engine: GuardedRatingEngine,
    pub artwork_resolver: GuardedArtworkResolver,
    pub now_playing: GuardedNowPlayingService,
    pub alert_store: GuardedAlertStore,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedStationStore {
    fn from_ref(input: &ServerState) -> Self {
        input.station_store.clone()
    }
}

impl FromRef<ServerState> for GuardedRatingEngine {
    fn from_ref(input: &ServerState) -> Self {
        input.rating_engine.clone()
    }
}

impl FromRef<ServerState> for GuardedArtworkResolver {
    fn from_ref(input: &ServerState) -> Self {
        input.artwork_resolver.clone()
    }
}

impl FromRef<ServerState> for GuardedNowPlayingService {
    fn from_ref(input: &ServerState) -> Self {
        input.now_playing.clone()
    }
}

impl FromRef<ServerState> for GuardedAlertStore {
    fn from_ref(input: &ServerState) -> Self {
        input.alert_store.clone()
    }
}
