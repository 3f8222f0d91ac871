mod models;
mod station_store;

pub use models::{Station, StationSeed};
pub use station_store::StationStore;
