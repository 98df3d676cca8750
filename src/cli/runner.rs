//! CLI runner - executes commands

use crate::blob::{AccessLevel, BlobItem, BlobService, StoreLocation};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::cli::quickstart::Quickstart;
use crate::config::Settings;
use crate::error::{Error, Result, ResultExt};
use crate::pagination::{AsyncLister, Cursor, PageFetcher};
use crate::state::{container_key, CheckpointManager};
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let settings = self.load_settings()?;
        let service = self.build_service(&settings)?;

        match &self.cli.command {
            Commands::Quickstart {
                no_pause,
                download_dir,
            } => {
                self.quickstart(service, settings, *no_pause, download_dir.clone())
                    .await
            }
            Commands::Create { container, access } => {
                self.create(&service, container, *access).await
            }
            Commands::SetAccess { container, access } => {
                self.set_access(&service, container, *access).await
            }
            Commands::Put {
                container,
                blob,
                file,
            } => self.put(&service, container, blob, file).await,
            Commands::Get {
                container,
                blob,
                output,
            } => self.get(&service, container, blob, output.as_deref()).await,
            Commands::Ls {
                container: Some(container),
                checkpoint,
                cursor,
                max_items,
            } => {
                self.list_blobs(
                    &service,
                    container,
                    checkpoint.as_deref(),
                    cursor.as_deref(),
                    *max_items,
                )
                .await
            }
            Commands::Ls {
                container: None, ..
            } => self.list_containers(&service).await,
            Commands::Delete { container } => self.delete(&service, container).await,
        }
    }

    /// Settings file (if any) with CLI overrides applied
    fn load_settings(&self) -> Result<Settings> {
        let mut settings = match &self.cli.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };

        if let Some(store) = &self.cli.store {
            settings.store.clone_from(store);
        }
        if let Some(page_size) = self.cli.page_size {
            settings.listing.page_size = page_size;
        }
        settings.validate()?;
        Ok(settings)
    }

    fn build_service(&self, settings: &Settings) -> Result<BlobService> {
        let location = StoreLocation::parse_with(&settings.store, settings.azure_credentials())?;
        debug!(
            store = %settings.store,
            scheme = location.scheme(),
            page_size = settings.listing.page_size,
            "Opened store"
        );
        Ok(BlobService::from_location(&location).with_page_size(settings.listing.page_size))
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn quickstart(
        &self,
        service: BlobService,
        mut settings: Settings,
        no_pause: bool,
        download_dir: Option<PathBuf>,
    ) -> Result<()> {
        if download_dir.is_some() {
            settings.quickstart.download_dir = download_dir;
        }

        let report = Quickstart::new(service, settings.quickstart)
            .with_pause(!no_pause)
            .run()
            .await?;

        info!(
            container = %report.container,
            blob = %report.blob,
            pages = report.pages,
            "Quickstart finished"
        );
        if self.cli.format == OutputFormat::Json {
            self.output_message(&json!({
                "type": "QUICKSTART",
                "container": report.container,
                "blob": report.blob,
                "listed": report.listed,
                "pages": report.pages,
                "download_path": report.download_path,
                "downloaded_bytes": report.downloaded_bytes,
            }));
        }
        Ok(())
    }

    async fn create(&self, service: &BlobService, name: &str, access: AccessLevel) -> Result<()> {
        let container = service.create_container(name, access).await?;
        let properties = container.properties().await?;
        self.output_message(&json!({
            "type": "CONTAINER",
            "container": properties,
        }));
        Ok(())
    }

    async fn set_access(
        &self,
        service: &BlobService,
        name: &str,
        access: AccessLevel,
    ) -> Result<()> {
        let properties = service.container(name).set_access_level(access).await?;
        self.output_message(&json!({
            "type": "CONTAINER",
            "container": properties,
        }));
        Ok(())
    }

    async fn put(&self, service: &BlobService, container: &str, blob: &str, file: &Path) -> Result<()> {
        let item = service
            .container(container)
            .upload_file(blob, file)
            .await
            .with_context(|| format!("Failed to upload {}", file.display()))?;
        self.output_blob(&item);
        Ok(())
    }

    async fn get(
        &self,
        service: &BlobService,
        container: &str,
        blob: &str,
        output: Option<&Path>,
    ) -> Result<()> {
        let container = service.container(container);
        match output {
            Some(path) => {
                let written = container.download_to_file(blob, path).await?;
                self.output_message(&json!({
                    "type": "DOWNLOAD",
                    "blob": blob,
                    "path": path,
                    "bytes": written,
                }));
            }
            None => {
                let data = container.download_blob(blob).await?;
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&data)?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    async fn delete(&self, service: &BlobService, name: &str) -> Result<()> {
        let deleted = service.delete_container(name).await?;
        self.output_message(&json!({
            "type": "DELETED",
            "container": name,
            "blobs": deleted,
        }));
        Ok(())
    }

    async fn list_containers(&self, service: &BlobService) -> Result<()> {
        for name in service.list_containers().await? {
            match self.cli.format {
                OutputFormat::Json => self.output_message(&json!({
                    "type": "CONTAINER",
                    "name": name,
                })),
                OutputFormat::Pretty => println!("{name}"),
            }
        }
        Ok(())
    }

    /// List a container's blobs, recording the cursor at every page boundary
    async fn list_blobs(
        &self,
        service: &BlobService,
        name: &str,
        checkpoint_path: Option<&Path>,
        cursor: Option<&str>,
        max_items: Option<usize>,
    ) -> Result<()> {
        let container = service.container(name);
        let checkpoint = match checkpoint_path {
            Some(path) => CheckpointManager::from_file(path)?,
            None => CheckpointManager::in_memory(),
        };
        let key = container_key(name);

        let start = match cursor {
            Some(raw) => Some(Cursor::new(raw)),
            None => checkpoint.get_cursor(&key).await,
        };
        if let Some(start) = &start {
            info!(container = name, cursor = %start, "Resuming listing");
        }

        let summary = list_with_checkpoint(
            &container,
            start,
            &checkpoint,
            &key,
            max_items,
            |item: &BlobItem| self.output_blob(item),
        )
        .await?;

        if self.cli.format == OutputFormat::Json {
            self.output_message(&json!({
                "type": "LISTING",
                "container": name,
                "items": summary.items,
                "pages": summary.pages,
                "complete": summary.complete,
                "resume_cursor": summary.resume_cursor,
            }));
        } else if let Some(resume) = summary.resume_cursor.filter(|_| !summary.complete) {
            println!("... more blobs follow, resume with --cursor '{resume}'");
        }
        Ok(())
    }

    // ========================================================================
    // Output
    // ========================================================================

    fn output_blob(&self, item: &BlobItem) {
        match self.cli.format {
            OutputFormat::Json => self.output_message(&json!({
                "type": "BLOB",
                "blob": item,
            })),
            OutputFormat::Pretty => println!("\tBlob name: {}", item.name),
        }
    }

    /// Output a JSON message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Outcome of a checkpointed listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSummary {
    pub items: u64,
    pub pages: u64,
    /// Whether the final page was reached
    pub complete: bool,
    /// Where a later run picks up; `None` once complete
    pub resume_cursor: Option<Cursor>,
}

/// Drive a listing, saving the cursor at each page boundary
///
/// Stops after `max_items` items if given. A stop inside a page only moves
/// the saved cursor back to that page's start, so the counters never
/// include items a later run repeats. A failed page fetch leaves the
/// checkpoint at the last completed page and is returned as the error.
pub async fn list_with_checkpoint<P, F>(
    fetcher: P,
    start: Option<Cursor>,
    checkpoint: &CheckpointManager,
    key: &str,
    max_items: Option<usize>,
    mut on_item: F,
) -> Result<ListingSummary>
where
    P: PageFetcher<Error = Error>,
    F: FnMut(&P::Item),
{
    let mut lister = AsyncLister::resume(fetcher, start);
    let mut items: u64 = 0;
    let mut page_items: u64 = 0;

    while max_items.map_or(true, |max| items < max as u64) {
        let Some(item) = lister.next().await else {
            break;
        };
        let item = item?;
        on_item(&item);
        items += 1;
        page_items += 1;

        if lister.at_page_boundary() {
            checkpoint
                .record_page(key, lister.cursor().cloned(), page_items)
                .await?;
            page_items = 0;
        }
    }

    let complete = lister.is_complete();
    let resume_cursor = if complete {
        None
    } else {
        lister.resume_cursor().cloned()
    };

    if complete {
        checkpoint.mark_completed(key).await?;
    } else if !lister.at_page_boundary() {
        // Stopped mid-page: the next run repeats this page from its start
        match &resume_cursor {
            Some(cursor) => checkpoint.set_cursor(key, cursor.clone()).await?,
            None => debug!(key, "Stopped inside the first page, next run starts over"),
        }
    }

    Ok(ListingSummary {
        items,
        pages: lister.pages_fetched(),
        complete,
        resume_cursor,
    })
}
