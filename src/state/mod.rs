//! Checkpoint module
//!
//! Persists the cursor of interrupted listings so they can be resumed.
//!
//! # Overview
//!
//! - `Checkpoint` - per-listing cursor and progress counters
//! - `CheckpointManager` - file-backed persistence with atomic writes

mod manager;
mod types;

pub use manager::CheckpointManager;
pub use types::{container_key, Checkpoint, ListingCheckpoint};
