//! Client-side sync engine.
//!
//! Keeps an optimistic snapshot of every group and member, applies local
//! mutations immediately, confirms them against the server, and reloads the
//! full snapshot after each commit or on a timer.
//!
//! # Usage
//!
//! ```no_run
//! use roastcheck::sync::{HttpClient, SyncEngine};
//!
//! # async fn demo() -> Result<(), roastcheck::sync::SyncError> {
//! let engine = SyncEngine::new(HttpClient::new("http://localhost:8080"));
//! engine.refresh().await?;
//! let group = engine.add_group(Some("Panel 1")).await?;
//! engine.add_member(group.id, Some("Alice")).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod engine;
pub mod error;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{HttpClient, RosterApi};
pub use engine::{RevalidationHandle, SyncEngine, SyncState, DEFAULT_REVALIDATE_INTERVAL};
pub use error::SyncError;
pub use snapshot::{is_sentinel, Snapshot};
