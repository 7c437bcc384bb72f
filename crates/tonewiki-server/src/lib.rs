//! HTTP server for tonewiki.
//!
//! Serves pages, images, uploads, comments and per-user history as JSON over
//! axum. Identity lives in a cookie session; every backend call runs on the
//! blocking pool.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod session;
pub mod state;

pub use config::{ServerConfig, StorageConfig};
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::WikiServer;
pub use state::AppState;
