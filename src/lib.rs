//! UniFind Backend Library
//!
//! Campus marketplace service: credential store, token service, access
//! guard, resource endpoints and a client session holder.
//! Exposes every module for the binaries and integration tests.

pub mod api;
pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod db;
pub mod marketplace;
pub mod middleware;

pub use api::{create_router, AppState};
pub use config::ServerConfig;
pub use db::Database;
