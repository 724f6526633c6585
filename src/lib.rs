//! roastcheck: check-in tracking for roast-tournament groups.
//!
//! - [`db`]: SQLite store for groups and members
//! - [`server`]: HTTP API over the store
//! - [`sync`]: optimistic client-side cache driven against the API

pub mod config;
pub mod db;
pub mod models;
pub mod server;
pub mod sync;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
