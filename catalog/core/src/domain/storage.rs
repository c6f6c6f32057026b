// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Object Store Trait - Anti-Corruption Layer for blob storage
//!
//! Version content lives in an external key -> blob store. This module
//! defines the contract the artifact lifecycle depends on, plus the
//! [`ScratchFile`] handle through which downloaded blobs are handed to
//! callers. Backends live in `crate::infrastructure::storage`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::version::ObjectKey;

/// Object store trait abstracting the blob backend
///
/// Implementations handle:
/// - Uploading a staged local file under a key
/// - Downloading a blob into a fresh scratch file
/// - Best-effort deletion
/// - Health monitoring
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store the file at `local_path` under `key`.
    ///
    /// The local file is left in place; removing it is the caller's job.
    async fn put(&self, key: &ObjectKey, local_path: &Path) -> Result<(), ObjectStoreError>;

    /// Copy the blob under `key` into a new scratch file.
    ///
    /// # Returns
    /// * `Ok(ScratchFile)` - owned by the caller until released
    /// * `Err(ObjectStoreError::NotFound)` if no blob exists under `key`
    async fn fetch_to_scratch(&self, key: &ObjectKey) -> Result<ScratchFile, ObjectStoreError>;

    /// Remove the blob under `key`. Removing a missing blob succeeds.
    async fn delete(&self, key: &ObjectKey) -> Result<(), ObjectStoreError>;

    /// Check that the backend is reachable and usable
    async fn health_check(&self) -> Result<(), ObjectStoreError>;
}

/// Object store errors
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ObjectStoreError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                ObjectStoreError::PermissionDenied(err.to_string())
            }
            _ => ObjectStoreError::Io(err.to_string()),
        }
    }
}

/// Transient local copy of a blob.
///
/// The caller owns the file until [`release`](Self::release) is called or the
/// handle is dropped, whichever comes first. Removal happens exactly once.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    released: AtomicBool,
}

impl ScratchFile {
    /// Reserve a unique scratch path for `key` inside `dir`.
    ///
    /// Nothing is created on disk; the backend writes the file. Names are
    /// `<key>-<uuid>` so concurrent fetches of one key never share a path.
    pub fn reserve(dir: &Path, key: &ObjectKey) -> Self {
        Self::adopt(dir.join(format!("{}-{}", key, Uuid::new_v4())))
    }

    /// Take ownership of an existing local file.
    pub fn adopt(path: PathBuf) -> Self {
        Self {
            path,
            released: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Open the scratch file for streaming to a client
    pub async fn open(&self) -> std::io::Result<tokio::fs::File> {
        tokio::fs::File::open(&self.path).await
    }

    /// Remove the local copy. Idempotent and infallible: a file that is
    /// already gone is fine, any other failure is logged and the file is
    /// left behind.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Released scratch file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove scratch file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        self.release();
    }
}
