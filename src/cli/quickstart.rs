//! Quickstart scenario
//!
//! Creates a uniquely named container, makes it public, uploads a text
//! blob, lists the container following continuation markers, downloads the
//! blob, and finally removes both the container and the downloaded file.
//! Cleanup runs even when an earlier step failed.

use crate::blob::{AccessLevel, BlobService, ContainerClient};
use crate::config::QuickstartSettings;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use uuid::Uuid;

/// What a quickstart run did
#[derive(Debug, Clone)]
pub struct QuickstartReport {
    pub container: String,
    pub blob: String,
    /// Blob names in listing order
    pub listed: Vec<String>,
    /// Listing pages fetched
    pub pages: u64,
    pub download_path: PathBuf,
    pub downloaded_bytes: u64,
}

/// The quickstart scenario bound to a blob service
pub struct Quickstart {
    service: BlobService,
    settings: QuickstartSettings,
    pause: bool,
}

impl Quickstart {
    pub fn new(service: BlobService, settings: QuickstartSettings) -> Self {
        Self {
            service,
            settings,
            pause: true,
        }
    }

    /// Wait for Enter before cleaning up
    #[must_use]
    pub fn with_pause(mut self, pause: bool) -> Self {
        self.pause = pause;
        self
    }

    /// Run every step, then clean up
    pub async fn run(&self) -> Result<QuickstartReport> {
        let container_name = format!("{}{}", self.settings.container_prefix, Uuid::new_v4());
        let blob_name = format!("QuickStart_{}.txt", Uuid::new_v4());
        let download_path = self.settings.resolve_download_dir()?.join(&blob_name);

        let outcome = self
            .steps(&container_name, &blob_name, &download_path)
            .await;
        let cleanup = self.cleanup(&container_name, &download_path).await;

        // A failed step wins over a failed cleanup
        let report = outcome?;
        cleanup?;
        Ok(report)
    }

    async fn steps(
        &self,
        container_name: &str,
        blob_name: &str,
        download_path: &Path,
    ) -> Result<QuickstartReport> {
        println!("\nCreating a container: {container_name}");
        let container = self
            .service
            .create_container(container_name, AccessLevel::Private)
            .await?;
        container.set_access_level(self.settings.access).await?;

        println!("\nCreating blob: {blob_name}");
        container
            .upload_blob(blob_name, self.settings.blob_body.clone())
            .await?;

        println!("\nList blobs in the container following continuation token");
        let (listed, pages) = list_names(&container).await?;

        println!("\nDownloading blob to {}", download_path.display());
        let downloaded_bytes = container.download_to_file(blob_name, download_path).await?;

        if self.pause {
            println!(
                "\nPaused, press the Enter key to delete resources created by the sample and exit the application"
            );
            wait_for_enter().await?;
        }

        Ok(QuickstartReport {
            container: container_name.to_string(),
            blob: blob_name.to_string(),
            listed,
            pages,
            download_path: download_path.to_path_buf(),
            downloaded_bytes,
        })
    }

    /// Remove the container and the downloaded file, whichever exist
    async fn cleanup(&self, container_name: &str, download_path: &Path) -> Result<()> {
        let mut first_error = None;

        match self.service.delete_container(container_name).await {
            Ok(deleted) => info!(container = container_name, deleted, "Cleaned up container"),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                warn!(container = container_name, error = %e, "Failed to delete container");
                first_error.get_or_insert(e);
            }
        }

        match tokio::fs::remove_file(download_path).await {
            Ok(()) => info!(path = %download_path.display(), "Removed downloaded file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %download_path.display(), error = %e, "Failed to remove downloaded file");
                first_error.get_or_insert(e.into());
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

async fn list_names(container: &ContainerClient) -> Result<(Vec<String>, u64)> {
    let mut lister = container.list_blobs();
    let mut names = Vec::new();
    while let Some(blob) = lister.next().await {
        let blob = blob?;
        println!("\tBlob name: {}", blob.name);
        names.push(blob.name);
    }
    Ok((names, lister.pages_fetched()))
}

async fn wait_for_enter() -> Result<()> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use std::sync::Arc;

    fn settings(download_dir: &Path) -> QuickstartSettings {
        QuickstartSettings {
            download_dir: Some(download_dir.to_path_buf()),
            ..QuickstartSettings::default()
        }
    }

    #[tokio::test]
    async fn test_quickstart_runs_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let service = BlobService::new(Arc::new(InMemory::new()));
        let quickstart = Quickstart::new(service.clone(), settings(dir.path())).with_pause(false);

        let report = quickstart.run().await.unwrap();

        assert!(report.container.starts_with("quickstartblobs"));
        assert!(report.blob.starts_with("QuickStart_"));
        assert!(report.blob.ends_with(".txt"));
        assert_eq!(report.listed, vec![report.blob.clone()]);
        assert_eq!(report.pages, 1);
        assert_eq!(report.downloaded_bytes, "Hello, World!".len() as u64);
        assert_eq!(report.download_path, dir.path().join(&report.blob));

        // Everything created has been removed
        assert!(!report.download_path.exists());
        assert!(service.list_containers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quickstart_cleans_up_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the download directory should be makes the download fail
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let service = BlobService::new(Arc::new(InMemory::new()));
        let quickstart = Quickstart::new(service.clone(), settings(&blocker)).with_pause(false);

        assert!(quickstart.run().await.is_err());
        assert!(service.list_containers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quickstart_custom_prefix_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let service = BlobService::new(Arc::new(InMemory::new()));
        let settings = QuickstartSettings {
            container_prefix: "demo-".to_string(),
            blob_body: "custom body".to_string(),
            ..settings(dir.path())
        };

        let report = Quickstart::new(service, settings)
            .with_pause(false)
            .run()
            .await
            .unwrap();
        assert!(report.container.starts_with("demo-"));
        assert_eq!(report.downloaded_bytes, "custom body".len() as u64);
    }
}
