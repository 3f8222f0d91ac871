use super::models::{Station, StationSeed};
use anyhow::Result;

pub trait StationStore: Send + Sync {
    /// Returns active stations ordered by display order.
    fn get_active_stations(&self) -> Result<Vec<Station>>;

    /// Returns all stations, active or not, ordered by display order.
    fn get_all_stations(&self) -> Result<Vec<Station>>;

    /// Returns the station with the given code.
    /// Returns Ok(None) if no such station exists.
    fn get_station_by_code(&self, code: &str) -> Result<Option<Station>>;

    /// Inserts the station, or updates every attribute of the station that
    /// already has the same code. Returns the stored station.
    fn upsert_station(&self, seed: &StationSeed) -> Result<Station>;
}
