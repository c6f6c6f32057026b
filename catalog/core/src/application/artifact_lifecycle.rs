// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Artifact Lifecycle Application Service
//!
//! Moves version content between clients and the object store:
//!
//! - **Upload**: stage the client stream in the scratch directory, store it
//!   under a fresh key, then sequence and insert the version row under a
//!   per-asset lock. The blob always lands before its row.
//! - **Download**: resolve the row, then fetch the blob into a
//!   [`ScratchFile`] the caller streams and releases.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::application::error::{CatalogError, Result};
use crate::domain::asset::AssetId;
use crate::domain::events::CatalogEvent;
use crate::domain::repository::{AssetRepository, RepositoryError, VersionRepository};
use crate::domain::search::PAGE_SIZE;
use crate::domain::storage::{ObjectStore, ObjectStoreError, ScratchFile};
use crate::domain::version::{
    next_version, BumpKind, NewVersion, ObjectKey, SemVer, Version, VersionOrder,
};
use crate::infrastructure::event_bus::EventBus;

const STAGING_BUFFER_SIZE: usize = 64 * 1024;

/// Client-supplied upload content
pub type ContentStream = Box<dyn AsyncRead + Send + Unpin>;

/// A new version upload
pub struct UploadRequest {
    pub asset_id: AssetId,
    /// Verified identity of the uploader
    pub author_id: String,
    pub content: ContentStream,
    pub message: String,
    pub bump: BumpKind,
}

/// A located version and its content in a scratch file.
///
/// The caller streams `file` and then releases it; dropping the download
/// releases it too.
#[derive(Debug)]
pub struct VersionDownload {
    pub version: Version,
    pub file: ScratchFile,
}

impl VersionDownload {
    pub fn release(&self) {
        self.file.release();
    }
}

// ============================================================================
// Service Trait
// ============================================================================

#[async_trait]
pub trait ArtifactService: Send + Sync {
    /// Store new content for an asset and record it as the next version
    async fn upload_version(&self, request: UploadRequest) -> Result<Version>;

    /// Fetch one exact version's content into a scratch file
    async fn download_version(&self, asset_id: AssetId, semver: SemVer)
        -> Result<VersionDownload>;

    /// One page of an asset's version history
    async fn list_versions(
        &self,
        asset_id: AssetId,
        order: VersionOrder,
        offset: usize,
    ) -> Result<Vec<Version>>;
}

// ============================================================================
// Standard Implementation
// ============================================================================

pub struct StandardArtifactService {
    assets: Arc<dyn AssetRepository>,
    versions: Arc<dyn VersionRepository>,
    store: Arc<dyn ObjectStore>,
    event_bus: Arc<EventBus>,
    scratch_dir: PathBuf,
    /// Serializes sequence-read and insert per asset
    locks: DashMap<AssetId, Arc<Mutex<()>>>,
}

impl StandardArtifactService {
    pub fn new(
        assets: Arc<dyn AssetRepository>,
        versions: Arc<dyn VersionRepository>,
        store: Arc<dyn ObjectStore>,
        event_bus: Arc<EventBus>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            assets,
            versions,
            store,
            event_bus,
            scratch_dir: scratch_dir.into(),
            locks: DashMap::new(),
        }
    }

    /// Copy the client stream into a staging file that is removed on drop
    async fn stage(
        &self,
        content: &mut ContentStream,
    ) -> Result<(tempfile::NamedTempFile, u64)> {
        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|e| CatalogError::StoreUnavailable(e.into()))?;

        let staged = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| CatalogError::StoreUnavailable(e.into()))?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(staged.path())
            .await
            .map_err(|e| CatalogError::StoreUnavailable(e.into()))?;

        let bytes = copy_upload(content, &mut file).await?;
        debug!("Staged {} bytes at {}", bytes, staged.path().display());
        Ok((staged, bytes))
    }

    fn asset_lock(&self, asset_id: AssetId) -> Arc<Mutex<()>> {
        self.locks
            .entry(asset_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Sequence and insert the row for an already-stored blob.
    ///
    /// A lost uniqueness race is retried once with a recomputed version.
    async fn record_version(
        &self,
        asset_id: AssetId,
        author_id: &str,
        message: &str,
        bump: BumpKind,
        object_key: &ObjectKey,
    ) -> Result<Version> {
        let lock = self.asset_lock(asset_id);
        let result = {
            let _guard = lock.lock().await;
            let mut retried = false;
            loop {
                let existing = match self.versions.list_semvers(asset_id).await {
                    Ok(existing) => existing,
                    Err(e) => break Err(e.into()),
                };
                let semver = match next_version(&existing, bump) {
                    Ok(semver) => semver,
                    Err(e) => break Err(e.into()),
                };

                let insert = self
                    .versions
                    .insert(NewVersion {
                        asset_id,
                        semver,
                        author_id: author_id.to_string(),
                        message: message.to_string(),
                        object_key: object_key.clone(),
                    })
                    .await;

                match insert {
                    Ok(version) => break Ok(version),
                    Err(RepositoryError::Conflict(msg)) => {
                        metrics::counter!("catalog_upload_conflicts_total").increment(1);
                        if retried {
                            break Err(CatalogError::Conflict(msg));
                        }
                        warn!(
                            "Version {} of asset {} was taken concurrently, recomputing",
                            semver, asset_id
                        );
                        retried = true;
                    }
                    Err(e) => break Err(e.into()),
                }
            }
        };

        drop(lock);
        self.locks
            .remove_if(&asset_id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }
}

/// Copy upload content into the staging sink.
///
/// Read failures are the client's; write failures are local I/O faults.
async fn copy_upload<R, W>(content: &mut R, sink: &mut W) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; STAGING_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = content.read(&mut buf).await.map_err(|e| {
            CatalogError::InvalidInput(format!("Failed to read upload stream: {}", e))
        })?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n]).await.map_err(|e| {
            error!("Failed to write staging file: {}", e);
            CatalogError::StoreUnavailable(e.into())
        })?;
        total += n as u64;
    }

    sink.flush()
        .await
        .map_err(|e| CatalogError::StoreUnavailable(e.into()))?;

    if total == 0 {
        return Err(CatalogError::InvalidInput("Upload is empty".to_string()));
    }
    Ok(total)
}

#[async_trait]
impl ArtifactService for StandardArtifactService {
    async fn upload_version(&self, request: UploadRequest) -> Result<Version> {
        let UploadRequest {
            asset_id,
            author_id,
            mut content,
            message,
            bump,
        } = request;

        info!("Uploading new {:?} version of asset {}", bump, asset_id);

        if !self.assets.exists(asset_id).await? {
            return Err(CatalogError::NotFound(format!("Asset {}", asset_id)));
        }

        let (staged, size_bytes) = self.stage(&mut content).await?;

        let object_key = ObjectKey::generate();
        self.store
            .put(&object_key, staged.path())
            .await
            .map_err(|e| {
                error!("Failed to store blob for asset {}: {}", asset_id, e);
                CatalogError::StoreUnavailable(e)
            })?;
        drop(staged);

        let version = match self
            .record_version(asset_id, &author_id, &message, bump, &object_key)
            .await
        {
            Ok(version) => version,
            Err(e) => {
                error!(
                    "Version row for asset {} not written ({}); blob {} is orphaned",
                    asset_id, e, object_key
                );
                return Err(e);
            }
        };

        metrics::counter!("catalog_versions_published_total").increment(1);
        self.event_bus.publish(CatalogEvent::VersionPublished {
            asset_id,
            semver: version.semver,
            author_id: version.author_id.clone(),
            object_key: version.object_key.clone(),
            size_bytes,
            published_at: version.created_at,
        });

        info!(
            "Published version {} of asset {} ({} bytes, key {})",
            version.semver, asset_id, size_bytes, version.object_key
        );
        Ok(version)
    }

    async fn download_version(
        &self,
        asset_id: AssetId,
        semver: SemVer,
    ) -> Result<VersionDownload> {
        debug!("Resolving version {} of asset {}", semver, asset_id);

        let version = self
            .versions
            .find(asset_id, semver)
            .await?
            .ok_or_else(|| {
                CatalogError::NotFound(format!("Version {} of asset {}", semver, asset_id))
            })?;

        // The row exists, so a missing blob is a store fault
        let file = self
            .store
            .fetch_to_scratch(&version.object_key)
            .await
            .map_err(|e| {
                error!(
                    "Failed to fetch blob {} for version {} of asset {}: {}",
                    version.object_key, semver, asset_id, e
                );
                match e {
                    ObjectStoreError::NotFound(key) => {
                        CatalogError::StoreUnavailable(ObjectStoreError::NotFound(format!(
                            "blob {} missing behind version row",
                            key
                        )))
                    }
                    other => CatalogError::StoreUnavailable(other),
                }
            })?;

        metrics::counter!("catalog_version_downloads_total").increment(1);
        self.event_bus.publish(CatalogEvent::VersionDownloaded {
            asset_id,
            semver,
            downloaded_at: Utc::now(),
        });

        Ok(VersionDownload { version, file })
    }

    async fn list_versions(
        &self,
        asset_id: AssetId,
        order: VersionOrder,
        offset: usize,
    ) -> Result<Vec<Version>> {
        if !self.assets.exists(asset_id).await? {
            return Err(CatalogError::NotFound(format!("Asset {}", asset_id)));
        }

        let versions = self
            .versions
            .list_for_asset(asset_id, order, offset, PAGE_SIZE)
            .await?;
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::{Asset, NewAsset};
    use crate::infrastructure::repositories::InMemoryCatalogRepository;
    use crate::infrastructure::storage::InMemoryObjectStore;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::TempDir;
    use tokio::io::ReadBuf;

    struct Fixture {
        _dir: TempDir,
        repo: InMemoryCatalogRepository,
        store: InMemoryObjectStore,
        service: StandardArtifactService,
        asset: Asset,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let repo = InMemoryCatalogRepository::new();
        let store = InMemoryObjectStore::new(dir.path().join("blobs")).unwrap();
        let service = StandardArtifactService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(store.clone()),
            Arc::new(EventBus::default()),
            dir.path().join("scratch"),
        );

        let asset = Asset::new(
            "jdoe",
            NewAsset {
                name: "Oak_Tree".to_string(),
                keywords: "plant forest".to_string(),
                image_uri: None,
            },
        );
        AssetRepository::insert(&repo, &asset).await.unwrap();

        Fixture {
            _dir: dir,
            repo,
            store,
            service,
            asset,
        }
    }

    impl Fixture {
        async fn try_upload(&self, content: &'static [u8], bump: BumpKind) -> Result<Version> {
            let request = upload(self.asset.id, content, bump);
            self.service.upload_version(request).await
        }

        async fn publish(&self, content: &'static [u8], bump: BumpKind) -> Version {
            self.try_upload(content, bump).await.unwrap()
        }
    }

    fn upload(asset_id: AssetId, content: &'static [u8], bump: BumpKind) -> UploadRequest {
        UploadRequest {
            asset_id,
            author_id: "jdoe".to_string(),
            content: Box::new(content),
            message: "update".to_string(),
            bump,
        }
    }

    #[tokio::test]
    async fn test_upload_sequences_versions() {
        let f = fixture().await;

        let v1 = f.publish(b"v1", BumpKind::Minor).await;
        let v2 = f.publish(b"v2", BumpKind::Minor).await;
        let v3 = f.publish(b"v3", BumpKind::Major).await;

        assert_eq!(v1.semver.to_string(), "0.1");
        assert_eq!(v2.semver.to_string(), "0.2");
        assert_eq!(v3.semver.to_string(), "1.0");
        assert!(f.store.contains(&v3.object_key));
        assert_eq!(f.store.len(), 3);
    }

    #[tokio::test]
    async fn test_upload_to_unknown_asset_writes_nothing() {
        let f = fixture().await;

        let request = upload(AssetId::new(), b"data", BumpKind::Minor);
        let result = f.service.upload_version(request).await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_upload_is_invalid() {
        let f = fixture().await;

        let result = f.try_upload(b"", BumpKind::Minor).await;
        assert!(matches!(result, Err(CatalogError::InvalidInput(_))));
        assert!(f.store.is_empty());
        assert!(f.repo.list_semvers(f.asset.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_outage_writes_no_row() {
        let f = fixture().await;
        f.store.set_unavailable(true);

        let result = f.try_upload(b"data", BumpKind::Minor).await;
        assert!(matches!(result, Err(CatalogError::StoreUnavailable(_))));
        assert!(f.repo.list_semvers(f.asset.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_staging_files_are_cleaned_up() {
        let f = fixture().await;
        f.publish(b"v1", BumpKind::Minor).await;
        let _ = f.try_upload(b"", BumpKind::Minor).await;

        let leftovers = std::fs::read_dir(&f.service.scratch_dir).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_download_round_trip_and_release() {
        let f = fixture().await;
        let v1 = f.publish(b"oak mesh", BumpKind::Minor).await;

        let download = f.service.download_version(f.asset.id, v1.semver).await.unwrap();
        assert_eq!(download.version, v1);
        assert_eq!(std::fs::read(download.file.path()).unwrap(), b"oak mesh");

        let path = download.file.path().to_path_buf();
        download.release();
        download.release();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_download_distinguishes_missing_row_from_missing_blob() {
        let f = fixture().await;
        let v1 = f.publish(b"oak", BumpKind::Minor).await;

        let unknown = f.service.download_version(f.asset.id, SemVer::new(9, 9)).await;
        assert!(matches!(unknown, Err(CatalogError::NotFound(_))));

        f.store.evict(&v1.object_key);
        let missing_blob = f.service.download_version(f.asset.id, v1.semver).await;
        assert!(matches!(missing_blob, Err(CatalogError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_list_versions_requires_asset() {
        let f = fixture().await;
        f.publish(b"v1", BumpKind::Minor).await;
        f.publish(b"v2", BumpKind::Minor).await;

        let history = f
            .service
            .list_versions(f.asset.id, VersionOrder::Ascending, 0)
            .await
            .unwrap();
        let semvers: Vec<String> = history.iter().map(|v| v.semver.to_string()).collect();
        assert_eq!(semvers, ["0.1", "0.2"]);

        let missing = f.service.list_versions(AssetId::new(), VersionOrder::Descending, 0).await;
        assert!(matches!(missing, Err(CatalogError::NotFound(_))));
    }

    /// Sink that rejects every write, as a full scratch volume does
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(
                io::ErrorKind::StorageFull,
                "no space left on device",
            )))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Client stream that breaks mid-transfer
    struct BrokenStream;

    impl AsyncRead for BrokenStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "client went away",
            )))
        }
    }

    #[tokio::test]
    async fn test_staging_write_failure_is_a_store_fault() {
        let mut content: &[u8] = b"oak mesh";

        let err = copy_upload(&mut content, &mut FullDisk).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::StoreUnavailable(ObjectStoreError::Io(_))
        ));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_unreadable_stream_is_invalid_input() {
        let mut sink = Vec::new();

        let err = copy_upload(&mut BrokenStream, &mut sink).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(_)));
        assert!(err.is_client_error());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_copy_upload_counts_bytes() {
        let mut content: &[u8] = b"bark texture";
        let mut sink = Vec::new();

        assert_eq!(copy_upload(&mut content, &mut sink).await.unwrap(), 12);
        assert_eq!(sink, b"bark texture");
    }

    #[tokio::test]
    async fn test_broken_upload_writes_nothing() {
        let f = fixture().await;
        let request = UploadRequest {
            asset_id: f.asset.id,
            author_id: "jdoe".to_string(),
            content: Box::new(BrokenStream),
            message: String::new(),
            bump: BumpKind::Minor,
        };

        let result = f.service.upload_version(request).await;
        assert!(matches!(result, Err(CatalogError::InvalidInput(_))));
        assert!(f.store.is_empty());
        assert!(f.repo.list_semvers(f.asset.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_minor_is_refused() {
        let f = fixture().await;
        let top = SemVer::new(0, u32::MAX);
        VersionRepository::insert(
            &f.repo,
            NewVersion {
                asset_id: f.asset.id,
                semver: top,
                author_id: "jdoe".to_string(),
                message: String::new(),
                object_key: ObjectKey::generate(),
            },
        )
        .await
        .unwrap();

        let result = f.try_upload(b"v2", BumpKind::Minor).await;
        assert!(matches!(result, Err(CatalogError::InvalidInput(_))));
        assert!(f.service.locks.is_empty());

        let major = f.publish(b"v2", BumpKind::Major).await;
        assert_eq!(major.semver, SemVer::new(1, 0));
    }

    #[tokio::test]
    async fn test_lock_map_is_pruned() {
        let f = fixture().await;
        f.publish(b"v1", BumpKind::Minor).await;
        assert!(f.service.locks.is_empty());
    }
}
