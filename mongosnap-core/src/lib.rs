//! mongosnap core - snapshot and restore of MongoDB databases
//!
//! This crate provides the building blocks used by the `mongosnap` binary:
//! - Store client abstraction with MongoDB and in-memory backends
//! - Snapshot writer, reader and catalog over a timestamped directory layout
//! - Line-delimited canonical extended JSON encoding
//! - Configuration loading, logging setup and the daily schedule window

pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod schedule;
pub mod snapshot;
pub mod store;

pub use config::*;
pub use error::{Result, SnapshotError};
pub use logging::init_logging;
pub use manager::SnapshotManager;
pub use schedule::ScheduleWindow;
pub use snapshot::{RestoreSummary, SnapshotSummary};
pub use store::{DocumentStore, MemoryStore, MongoStore};
