//! SQLite persistence for stations, songs and rating events (`radio.db`).

mod schema;
mod sqlite_radio_store;

pub use sqlite_radio_store::SqliteRadioStore;
