//! `campus-server` exposes the campus retrieval core over HTTP.
//! Search returns ranked passages; chat composes an answer from them.

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;

pub use config::{ServerConfig, bootstrap};
pub use error::ApiError;
pub use server::{AppState, app_router, run_server};
