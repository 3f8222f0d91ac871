mod alert_routes;
mod blocking;
mod artwork_routes;
pub mod client_ip;
pub mod config;
mod http_layers;
mod metadata_routes;
mod rating_routes;
#[allow(clippy::module_inception)]
pub mod server;
pub mod state;
mod station_routes;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
