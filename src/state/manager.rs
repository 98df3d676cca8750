//! Checkpoint manager
//!
//! Persists listing checkpoints as JSON, writing a temp file and renaming
//! it over the target so a crash never leaves a half-written checkpoint.

use super::types::{Checkpoint, ListingCheckpoint};
use crate::error::{Error, Result};
use crate::pagination::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Loads, updates and saves listing checkpoints
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    /// Checkpoint file; empty in in-memory mode
    path: PathBuf,
    checkpoint: Arc<RwLock<Checkpoint>>,
    /// Save after every update
    auto_save: bool,
}

impl CheckpointManager {
    /// File-backed manager that saves after every update
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_mode(path.as_ref().to_path_buf(), Checkpoint::new(), true)
    }

    /// File-backed manager that only saves on [`CheckpointManager::save`]
    pub fn without_auto_save(path: impl AsRef<Path>) -> Self {
        Self::with_mode(path.as_ref().to_path_buf(), Checkpoint::new(), false)
    }

    /// Manager with no file persistence
    pub fn in_memory() -> Self {
        Self::with_mode(PathBuf::new(), Checkpoint::new(), false)
    }

    fn with_mode(path: PathBuf, checkpoint: Checkpoint, auto_save: bool) -> Self {
        Self {
            path,
            checkpoint: Arc::new(RwLock::new(checkpoint)),
            auto_save,
        }
    }

    /// File-backed manager, loading the existing checkpoint if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let checkpoint = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read checkpoint file: {e}")))?;
            parse(&contents)?
        } else {
            Checkpoint::new()
        };
        Ok(Self::with_mode(path, checkpoint, true))
    }

    /// In-memory manager seeded from inline JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::with_mode(PathBuf::new(), parse(json)?, false))
    }

    /// Replace the cached checkpoint with the file's contents
    pub async fn load(&self) -> Result<()> {
        if self.is_in_memory() || !self.path.exists() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to read checkpoint file: {e}")))?;
        let loaded = parse(&contents)?;
        *self.checkpoint.write().await = loaded;
        Ok(())
    }

    /// Write the checkpoint file; a no-op in in-memory mode
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }
        self.save_to_file(&self.path).await
    }

    /// Write the checkpoint to a specific path
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.to_json_pretty().await?;
        let path = path.as_ref();

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write checkpoint file: {e}")))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename checkpoint file: {e}")))?;

        debug!(path = %path.display(), "Saved checkpoint");
        Ok(())
    }

    /// Apply `f` to a listing's checkpoint, then auto-save
    async fn update<F>(&self, key: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut ListingCheckpoint),
    {
        f(self.checkpoint.write().await.get_mut(key));
        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    /// Cursor to resume `key` from, `None` to start over
    pub async fn get_cursor(&self, key: &str) -> Option<Cursor> {
        self.checkpoint.read().await.resume_cursor(key).cloned()
    }

    /// Snapshot of one listing's checkpoint
    pub async fn get(&self, key: &str) -> Option<ListingCheckpoint> {
        self.checkpoint.read().await.get(key).cloned()
    }

    /// Record a page boundary of `key`
    pub async fn record_page(&self, key: &str, cursor: Option<Cursor>, items: u64) -> Result<()> {
        self.update(key, |listing| listing.record_page(cursor, items))
            .await
    }

    /// Point `key` at a cursor without recording a page
    pub async fn set_cursor(&self, key: &str, cursor: Cursor) -> Result<()> {
        self.update(key, |listing| listing.set_cursor(cursor)).await
    }

    /// Mark `key` as fully listed
    pub async fn mark_completed(&self, key: &str) -> Result<()> {
        self.update(key, ListingCheckpoint::mark_completed).await
    }

    /// Forget one listing
    pub async fn clear(&self, key: &str) -> Result<()> {
        self.checkpoint.write().await.remove(key);
        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    /// Forget every listing
    pub async fn clear_all(&self) -> Result<()> {
        *self.checkpoint.write().await = Checkpoint::new();
        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    pub async fn to_json(&self) -> Result<String> {
        let checkpoint = self.checkpoint.read().await;
        serde_json::to_string(&*checkpoint)
            .map_err(|e| Error::state(format!("Failed to serialize checkpoint: {e}")))
    }

    pub async fn to_json_pretty(&self) -> Result<String> {
        let checkpoint = self.checkpoint.read().await;
        serde_json::to_string_pretty(&*checkpoint)
            .map_err(|e| Error::state(format!("Failed to serialize checkpoint: {e}")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

fn parse(contents: &str) -> Result<Checkpoint> {
    serde_json::from_str(contents)
        .map_err(|e| Error::state(format!("Failed to parse checkpoint: {e}")))
}
