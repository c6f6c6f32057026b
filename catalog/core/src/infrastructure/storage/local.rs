// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Filesystem Object Store
//!
//! Filesystem-based implementation of [`ObjectStore`] for single-node
//! development and testing. Each blob is a file named after its key under
//! the base directory.
//!
//! **Limitations:**
//! - No sharing across machines
//! - No replication or high availability

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::domain::storage::{ObjectStore, ObjectStoreError, ScratchFile};
use crate::domain::version::ObjectKey;

/// Local filesystem object store
pub struct LocalObjectStore {
    /// Base directory for blobs (e.g. "/var/lib/griddle/objects")
    base_path: PathBuf,
    scratch_dir: PathBuf,
}

impl LocalObjectStore {
    /// Create a local store, creating and probing both directories.
    pub fn new(
        base_path: impl Into<PathBuf>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Result<Self, ObjectStoreError> {
        let base_path = base_path.into();
        let scratch_dir = scratch_dir.into();

        ensure_writable(&base_path)?;
        ensure_writable(&scratch_dir)?;

        Ok(Self {
            base_path,
            scratch_dir,
        })
    }

    fn blob_path(&self, key: &ObjectKey) -> PathBuf {
        self.base_path.join(key.as_str())
    }
}

fn ensure_writable(dir: &Path) -> Result<(), ObjectStoreError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        ObjectStoreError::Io(format!(
            "Failed to create directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let probe = dir.join(format!(".griddle-probe-{}", Uuid::new_v4()));
    std::fs::write(&probe, b"probe").map_err(|e| {
        ObjectStoreError::Io(format!(
            "Directory {} is not writable: {}",
            dir.display(),
            e
        ))
    })?;
    std::fs::remove_file(&probe)
        .map_err(|e| ObjectStoreError::Io(format!("Failed to cleanup probe file: {}", e)))?;

    Ok(())
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &ObjectKey, local_path: &Path) -> Result<(), ObjectStoreError> {
        let target = self.blob_path(key);
        // Stage next to the target so the rename stays on one filesystem
        let partial = self
            .base_path
            .join(format!(".{}.partial-{}", key, Uuid::new_v4()));

        if let Err(e) = tokio::fs::copy(local_path, &partial).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(ObjectStoreError::Io(format!(
                "Failed to copy {} into store: {}",
                local_path.display(),
                e
            )));
        }

        if let Err(e) = tokio::fs::rename(&partial, &target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }

        debug!("Stored blob {} at {}", key, target.display());
        Ok(())
    }

    async fn fetch_to_scratch(&self, key: &ObjectKey) -> Result<ScratchFile, ObjectStoreError> {
        let source = self.blob_path(key);
        let scratch = ScratchFile::reserve(&self.scratch_dir, key);

        match tokio::fs::copy(&source, scratch.path()).await {
            Ok(bytes) => {
                debug!("Fetched blob {} ({} bytes) to {}", key, bytes, scratch.path().display());
                Ok(scratch)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !source.exists() => {
                Err(ObjectStoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), ObjectStoreError> {
        match tokio::fs::remove_file(self.blob_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> Result<(), ObjectStoreError> {
        let metadata = tokio::fs::metadata(&self.base_path).await.map_err(|e| {
            ObjectStoreError::Unavailable(format!(
                "Base directory {} is not accessible: {}",
                self.base_path.display(),
                e
            ))
        })?;

        if !metadata.is_dir() {
            return Err(ObjectStoreError::Unavailable(format!(
                "Base path {} is not a directory",
                self.base_path.display()
            )));
        }

        Ok(())
    }
}
