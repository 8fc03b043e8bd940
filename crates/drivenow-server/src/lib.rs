//! DriveNow HTTP server.
//!
//! Wires the storage backends and auth services into an axum router and
//! runs it. See [`server::build_app`] for the route table.

pub mod admin;
pub mod audit;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::AppConfig;
pub use error::ApiError;
pub use observability::{init_tracing, init_tracing_with_level, shutdown_tracing};
pub use server::{AppState, DriveNowServer, ServerBuilder, Storage, build_app};
