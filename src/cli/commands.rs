//! CLI commands and argument parsing

use crate::blob::AccessLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated blob listing and storage quickstart
#[derive(Parser, Debug)]
#[command(name = "blobpager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Store location: memory://, /path, file:///path, s3://bucket/prefix,
    /// gs://bucket/prefix, az://container/prefix (default: a per-user data
    /// directory)
    #[arg(short, long, global = true)]
    pub store: Option<String>,

    /// Settings file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Blobs requested per listing page
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a container, upload, list, download, then clean everything up
    Quickstart {
        /// Do not wait for Enter before cleaning up
        #[arg(long)]
        no_pause: bool,

        /// Directory the blob is downloaded into
        #[arg(long)]
        download_dir: Option<PathBuf>,
    },

    /// Create a container
    Create {
        container: String,

        /// Public access level
        #[arg(long, value_enum, default_value = "private")]
        access: AccessLevel,
    },

    /// Change a container's public access level
    SetAccess {
        container: String,

        #[arg(value_enum)]
        access: AccessLevel,
    },

    /// Upload a local file as a blob
    Put {
        container: String,
        blob: String,
        file: PathBuf,
    },

    /// Download a blob (to stdout without --output)
    Get {
        container: String,
        blob: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List containers, or the blobs of one container
    Ls {
        container: Option<String>,

        /// Checkpoint file: resume from it and record progress per page
        #[arg(long)]
        checkpoint: Option<PathBuf>,

        /// Start from this continuation marker instead of the checkpoint
        #[arg(long)]
        cursor: Option<String>,

        /// Stop after this many blobs
        #[arg(long)]
        max_items: Option<usize>,
    },

    /// Delete a container and all of its blobs
    Delete { container: String },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Pretty,
    /// JSON output (one object per line)
    Json,
}
