//! CLI module
//!
//! Command-line interface over the blob service.
//!
//! # Commands
//!
//! - `quickstart` - Create, upload, list, download, then clean up
//! - `create` / `set-access` / `delete` - Manage containers
//! - `put` / `get` - Upload and download blobs
//! - `ls` - List containers, or page through a container's blobs

mod commands;
mod quickstart;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use quickstart::{Quickstart, QuickstartReport};
pub use runner::{list_with_checkpoint, ListingSummary, Runner};
