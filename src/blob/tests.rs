//! Tests for blob module

use super::*;
use crate::error::Error;
use crate::pagination::{Cursor, PageFetcher};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore, PutMultipartOpts,
    PutOptions, PutPayload, PutResult,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use test_case::test_case;

fn memory_service() -> BlobService {
    BlobService::new(Arc::new(InMemory::new()))
}

async fn container_with(service: &BlobService, name: &str, blobs: &[&str]) -> ContainerClient {
    let container = service
        .create_container(name, AccessLevel::Private)
        .await
        .unwrap();
    for blob in blobs {
        container
            .upload_blob(blob, Bytes::from(format!("body of {blob}")))
            .await
            .unwrap();
    }
    container
}

fn names(items: &[BlobItem]) -> Vec<&str> {
    items.iter().map(|b| b.name.as_str()).collect()
}

// ============================================================================
// Container Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_create_container() {
    let service = memory_service();
    let container = service
        .create_container("quickstartblobs", AccessLevel::Private)
        .await
        .unwrap();

    assert!(container.exists().await.unwrap());
    let properties = container.properties().await.unwrap();
    assert_eq!(properties.name, "quickstartblobs");
    assert_eq!(properties.access, AccessLevel::Private);
}

#[tokio::test]
async fn test_create_container_twice_fails() {
    let service = memory_service();
    service
        .create_container("photos", AccessLevel::Blob)
        .await
        .unwrap();

    let err = service
        .create_container("photos", AccessLevel::Blob)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ContainerExists { name } if name == "photos"));
}

#[tokio::test]
async fn test_create_container_rejects_bad_name() {
    let service = memory_service();
    let err = service
        .create_container("Bad_Name", AccessLevel::Private)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidContainerName { .. }));
}

#[tokio::test]
async fn test_set_access_level() {
    let service = memory_service();
    let container = container_with(&service, "photos", &[]).await;

    let properties = container
        .set_access_level(AccessLevel::Container)
        .await
        .unwrap();
    assert_eq!(properties.access, AccessLevel::Container);
    assert_eq!(
        container.properties().await.unwrap().access,
        AccessLevel::Container
    );
}

#[tokio::test]
async fn test_missing_container_operations() {
    let service = memory_service();
    let container = service.container("ghost");

    assert!(!container.exists().await.unwrap());
    assert!(matches!(
        container.properties().await.unwrap_err(),
        Error::ContainerNotFound { .. }
    ));
    assert!(matches!(
        container.upload_blob("a.txt", "data").await.unwrap_err(),
        Error::ContainerNotFound { .. }
    ));
    assert!(matches!(
        service.delete_container("ghost").await.unwrap_err(),
        Error::ContainerNotFound { .. }
    ));
}

#[tokio::test]
async fn test_delete_container_removes_all_blobs() {
    let service = memory_service().with_page_size(2);
    let blobs = ["a", "b", "c", "d", "e"];
    let container = container_with(&service, "photos", &blobs).await;
    let keep = container_with(&service, "keepers", &["z"]).await;

    let deleted = service.delete_container("photos").await.unwrap();
    assert_eq!(deleted, 5);
    assert!(!container.exists().await.unwrap());
    assert!(container.download_blob("a").await.is_err());

    // Other containers are untouched
    assert_eq!(keep.download_blob("z").await.unwrap(), "body of z");
}

#[tokio::test]
async fn test_list_containers() {
    let service = memory_service();
    container_with(&service, "zebra", &["x"]).await;
    container_with(&service, "alpha", &[]).await;

    assert_eq!(service.list_containers().await.unwrap(), vec!["alpha", "zebra"]);

    service.delete_container("zebra").await.unwrap();
    assert_eq!(service.list_containers().await.unwrap(), vec!["alpha"]);
}

#[tokio::test]
async fn test_service_root_prefix() {
    let store: Arc<InMemory> = Arc::new(InMemory::new());
    let service = BlobService::new(store.clone()).with_root("/runs/today/");
    let container = container_with(&service, "photos", &["cat.png"]).await;

    let meta = store
        .head(&object_store::path::Path::from("runs/today/photos/cat.png"))
        .await
        .unwrap();
    assert_eq!(meta.size as u64, container.blob_properties("cat.png").await.unwrap().size);
    assert_eq!(service.list_containers().await.unwrap(), vec!["photos"]);
}

// ============================================================================
// Blob Tests
// ============================================================================

#[tokio::test]
async fn test_upload_and_download() {
    let service = memory_service();
    let container = container_with(&service, "photos", &[]).await;

    let item = container
        .upload_blob("QuickStart_1.txt", "Hello, World!")
        .await
        .unwrap();
    assert_eq!(item.name, "QuickStart_1.txt");
    assert_eq!(item.size, 13);

    let body = container.download_blob("QuickStart_1.txt").await.unwrap();
    assert_eq!(body, Bytes::from_static(b"Hello, World!"));
}

#[tokio::test]
async fn test_upload_replaces_blob() {
    let service = memory_service();
    let container = container_with(&service, "photos", &["a.txt"]).await;

    container.upload_blob("a.txt", "v2").await.unwrap();
    assert_eq!(container.download_blob("a.txt").await.unwrap(), "v2");
    assert_eq!(
        names(&container.list_blobs().try_collect().await.unwrap()),
        vec!["a.txt"]
    );
}

#[tokio::test]
async fn test_download_to_file() {
    let service = memory_service();
    let container = container_with(&service, "photos", &["nested/a.txt"]).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("a.txt");

    let written = container
        .download_to_file("nested/a.txt", &path)
        .await
        .unwrap();
    assert_eq!(written, "body of nested/a.txt".len() as u64);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "body of nested/a.txt"
    );
}

#[tokio::test]
async fn test_upload_file() {
    let service = memory_service();
    let container = container_with(&service, "photos", &[]).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.txt");
    std::fs::write(&path, "from disk").unwrap();

    container.upload_file("remote.txt", &path).await.unwrap();
    assert_eq!(container.download_blob("remote.txt").await.unwrap(), "from disk");
}

#[tokio::test]
async fn test_missing_blob() {
    let service = memory_service();
    let container = container_with(&service, "photos", &[]).await;

    let err = container.download_blob("nope.txt").await.unwrap_err();
    assert!(matches!(err, Error::BlobNotFound { ref name, .. } if name == "nope.txt"));
    assert!(err.is_not_found());

    assert!(container.delete_blob("nope.txt").await.unwrap_err().is_not_found());
    assert!(container.blob_properties("nope.txt").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_blob() {
    let service = memory_service();
    let container = container_with(&service, "photos", &["a", "b"]).await;

    container.delete_blob("a").await.unwrap();
    assert_eq!(
        names(&container.list_blobs().try_collect().await.unwrap()),
        vec!["b"]
    );
}

#[tokio::test]
async fn test_reserved_blob_name_rejected() {
    let service = memory_service();
    let container = container_with(&service, "photos", &[]).await;

    assert!(container.upload_blob(PROPERTIES_OBJECT, "x").await.is_err());
    // Properties untouched
    assert_eq!(container.properties().await.unwrap().name, "photos");
}

// ============================================================================
// Listing Tests
// ============================================================================

#[tokio::test]
async fn test_list_blobs_page_cursor_is_last_name() {
    let service = memory_service();
    let container = container_with(&service, "photos", &["c", "a", "b", "d"]).await;

    let page = container.list_blobs_page(None, 3).await.unwrap();
    assert_eq!(names(page.items()), vec!["a", "b", "c"]);
    assert_eq!(page.next_cursor(), Some(&Cursor::new("c")));

    let page = container
        .list_blobs_page(page.next_cursor(), 3)
        .await
        .unwrap();
    assert_eq!(names(page.items()), vec!["d"]);
    assert!(page.is_last());
}

#[tokio::test]
async fn test_list_blobs_page_exact_fit_has_no_cursor() {
    let service = memory_service();
    let container = container_with(&service, "photos", &["a", "b"]).await;

    let page = container.list_blobs_page(None, 2).await.unwrap();
    assert_eq!(names(page.items()), vec!["a", "b"]);
    assert!(page.is_last());
}

#[tokio::test]
async fn test_list_blobs_empty_container() {
    let service = memory_service();
    let container = container_with(&service, "photos", &[]).await;

    let mut lister = container.list_blobs();
    assert!(lister.next().await.is_none());
    assert_eq!(lister.pages_fetched(), 1);
}

#[tokio::test]
async fn test_list_blobs_missing_container_is_fetch_failure() {
    let service = memory_service();
    let container = service.container("ghost");

    let mut lister = container.list_blobs();
    let err = lister.next().await.unwrap().unwrap_err();
    assert!(err.is_fetch_failed());
    assert!(err.is_not_found());
    assert!(lister.next().await.is_none());
}

#[tokio::test]
async fn test_list_blobs_skips_other_containers() {
    let service = memory_service();
    let container = container_with(&service, "photos", &["a"]).await;
    container_with(&service, "photos2", &["b"]).await;

    let items = container.list_blobs().try_collect().await.unwrap();
    assert_eq!(names(&items), vec!["a"]);
}

#[test_case(7, 1, 7)]
#[test_case(7, 3, 3)]
#[test_case(6, 3, 2)]
#[test_case(7, 100, 1)]
#[tokio::test]
async fn test_list_blobs_paging(total: usize, page_size: usize, expected_pages: u64) {
    let service = memory_service().with_page_size(page_size);
    let blobs: Vec<String> = (0..total).map(|i| format!("blob-{i:03}.txt")).collect();
    let refs: Vec<&str> = blobs.iter().map(String::as_str).collect();
    let container = container_with(&service, "photos", &refs).await;

    let mut lister = container.list_blobs();
    let mut listed = Vec::new();
    while let Some(item) = lister.next().await {
        listed.push(item.unwrap().name);
    }

    assert_eq!(listed, blobs);
    assert_eq!(lister.pages_fetched(), expected_pages);
}

#[tokio::test]
async fn test_list_blobs_resume_from_cursor() {
    let service = memory_service().with_page_size(2);
    let container = container_with(&service, "photos", &["a", "b", "c", "d", "e"]).await;

    let mut first = container.list_blobs();
    let mut head = Vec::new();
    for _ in 0..2 {
        head.push(first.next().await.unwrap().unwrap().name);
    }
    assert!(first.at_page_boundary());
    let saved = first.cursor().cloned();
    assert_eq!(saved, Some(Cursor::new("b")));

    let tail = container.list_blobs_from(saved).try_collect().await.unwrap();
    assert_eq!(head, vec!["a", "b"]);
    assert_eq!(names(&tail), vec!["c", "d", "e"]);
}

#[tokio::test]
async fn test_list_blobs_stream() {
    let service = memory_service().with_page_size(2);
    let container = container_with(&service, "photos", &["a", "dir/b", "dir/c"]).await;

    let items: Vec<BlobItem> = container
        .list_blobs()
        .into_stream()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(names(&items), vec!["a", "dir/b", "dir/c"]);
}

#[tokio::test]
async fn test_container_client_is_page_fetcher() {
    let service = memory_service();
    let container = container_with(&service, "photos", &["a", "b", "c"]).await;
    let container = container.with_page_size(2);

    let page = container.fetch_page(None).await.unwrap();
    assert_eq!(names(page.items()), vec!["a", "b"]);
    let page = container.fetch_page(page.next_cursor()).await.unwrap();
    assert_eq!(names(page.items()), vec!["c"]);
    assert!(page.is_last());
}

#[tokio::test]
async fn test_list_blobs_on_local_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFileSystem::new_with_prefix(dir.path()).unwrap();
    let service = BlobService::new(Arc::new(store))
        .with_page_size(2)
        .with_ordered_listing(false);
    let container = container_with(&service, "photos", &["b", "a", "c", "nested/d"]).await;

    let items = container.list_blobs().try_collect().await.unwrap();
    assert_eq!(names(&items), vec!["a", "b", "c", "nested/d"]);

    service.delete_container("photos").await.unwrap();
    assert!(!container.exists().await.unwrap());
}

// ============================================================================
// Listing Cost Tests
// ============================================================================

/// Store that counts the objects its listings hand out
#[derive(Debug)]
struct CountingStore {
    inner: InMemory,
    listed: Arc<AtomicUsize>,
}

impl CountingStore {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let listed = Arc::new(AtomicUsize::new(0));
        let store = Self {
            inner: InMemory::new(),
            listed: Arc::clone(&listed),
        };
        (store, listed)
    }

    fn counted<'a>(
        &self,
        stream: BoxStream<'a, object_store::Result<ObjectMeta>>,
    ) -> BoxStream<'a, object_store::Result<ObjectMeta>> {
        let listed = Arc::clone(&self.listed);
        stream
            .inspect_ok(move |_| {
                listed.fetch_add(1, Ordering::SeqCst);
            })
            .boxed()
    }
}

impl std::fmt::Display for CountingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Counting({})", self.inner)
    }
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn put_opts(
        &self,
        location: &ObjectPath,
        payload: PutPayload,
        opts: PutOptions,
    ) -> object_store::Result<PutResult> {
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &ObjectPath,
        opts: PutMultipartOpts,
    ) -> object_store::Result<Box<dyn MultipartUpload>> {
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(
        &self,
        location: &ObjectPath,
        options: GetOptions,
    ) -> object_store::Result<GetResult> {
        self.inner.get_opts(location, options).await
    }

    async fn delete(&self, location: &ObjectPath) -> object_store::Result<()> {
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&ObjectPath>) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
        self.counted(self.inner.list(prefix))
    }

    fn list_with_offset(
        &self,
        prefix: Option<&ObjectPath>,
        offset: &ObjectPath,
    ) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
        self.counted(self.inner.list_with_offset(prefix, offset))
    }

    async fn list_with_delimiter(
        &self,
        prefix: Option<&ObjectPath>,
    ) -> object_store::Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &ObjectPath, to: &ObjectPath) -> object_store::Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(
        &self,
        from: &ObjectPath,
        to: &ObjectPath,
    ) -> object_store::Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}

#[tokio::test]
async fn test_list_blobs_page_reads_a_bounded_batch() {
    let (store, listed) = CountingStore::new();
    let service = BlobService::new(Arc::new(store)).with_page_size(10);
    let blobs: Vec<String> = (0..200).map(|i| format!("blob-{i:04}")).collect();
    let refs: Vec<&str> = blobs.iter().map(String::as_str).collect();
    let container = container_with(&service, "photos", &refs).await;

    // One page: ten blobs, the lookahead blob and the properties object
    listed.store(0, Ordering::SeqCst);
    let page = container.list_blobs_page(None, 10).await.unwrap();
    assert_eq!(page.len(), 10);
    assert!(listed.load(Ordering::SeqCst) <= 12);

    // Later pages start after the marker and read the same amount
    listed.store(0, Ordering::SeqCst);
    let page = container.list_blobs_page(page.next_cursor(), 10).await.unwrap();
    assert_eq!(names(page.items())[0], "blob-0010");
    assert!(listed.load(Ordering::SeqCst) <= 11);

    // A full listing reads each blob about once
    listed.store(0, Ordering::SeqCst);
    let mut lister = container.list_blobs();
    let mut count = 0;
    while let Some(item) = lister.next().await {
        item.unwrap();
        count += 1;
    }
    assert_eq!(count, 200);
    assert_eq!(lister.pages_fetched(), 20);
    assert!(listed.load(Ordering::SeqCst) <= 200 + 2 * 20);
}
