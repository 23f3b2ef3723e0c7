//! Pipewatch Sync
//!
//! Keeps a local view of the remote pipeline job in step with the job runner.
//!
//! Architecture:
//! - Runner: the [`JobRunner`] seam over the HTTP client, replaceable in tests
//! - Scheduler: a cancellable, non-overlapping poll loop with bounded retry
//! - Reconciler: merges one poll's responses into the next snapshot
//! - Controller: run/reset/initialize commands and the published snapshot
//!
//! The controller never executes pipeline logic itself. It issues commands,
//! polls while a run is active and publishes immutable snapshots plus a
//! side channel of one-shot [`SyncEvent`]s.

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod reconciler;
pub mod runner;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use config::{RetryPolicy, SyncConfig};
pub use controller::PipelineSyncController;
pub use error::{Command, SyncError};
pub use event::SyncEvent;
pub use runner::JobRunner;
