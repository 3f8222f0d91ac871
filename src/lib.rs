//! RadioAwa Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod alerts;
pub mod artwork;
pub mod config;
pub mod environment;
pub mod metadata;
pub mod metrics;
pub mod radio_store;
pub mod rating;
pub mod server;
pub mod sqlite_persistence;
pub mod station;

// Re-export commonly used types for convenience
pub use alerts::{AlertStore, SqliteAlertStore};
pub use radio_store::SqliteRadioStore;
pub use rating::{RatingEngine, RatingPolicy};
pub use server::{make_app, run_server, RequestsLoggingLevel};
