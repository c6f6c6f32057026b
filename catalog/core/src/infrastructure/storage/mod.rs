// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Object Store Infrastructure Module
//!
//! Concrete implementations of the [`ObjectStore`] trait and the factory that
//! selects one from configuration.

pub mod local;
pub mod s3;

pub use local::LocalObjectStore;
pub use s3::{S3ObjectStore, S3Settings};

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::config::ObjectStoreBackend;
use crate::domain::storage::{ObjectStore, ObjectStoreError};

/// Factory function to create an object store from configuration
pub fn create_object_store(
    backend: &ObjectStoreBackend,
    scratch_dir: impl Into<PathBuf>,
) -> Result<Arc<dyn ObjectStore>, ObjectStoreError> {
    let scratch_dir = scratch_dir.into();
    match backend {
        ObjectStoreBackend::Local { base_path } => {
            Ok(Arc::new(LocalObjectStore::new(base_path, scratch_dir)?))
        }
        ObjectStoreBackend::S3 {
            bucket,
            endpoint,
            region,
            access_key_id,
            secret_access_key,
        } => Ok(Arc::new(S3ObjectStore::new(
            S3Settings {
                bucket: bucket.clone(),
                endpoint: endpoint.clone(),
                region: region.clone(),
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
            },
            scratch_dir,
        )?)),
        ObjectStoreBackend::Memory => Ok(Arc::new(InMemoryObjectStore::new(scratch_dir)?)),
    }
}

pub use memory::InMemoryObjectStore;

mod memory {
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::RwLock;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use crate::domain::storage::{ObjectStore, ObjectStoreError, ScratchFile};
    use crate::domain::version::ObjectKey;

    /// HashMap-backed object store with failure injection for tests
    #[derive(Clone)]
    pub struct InMemoryObjectStore {
        blobs: Arc<RwLock<HashMap<ObjectKey, Bytes>>>,
        scratch_dir: PathBuf,
        unavailable: Arc<AtomicBool>,
    }

    impl InMemoryObjectStore {
        pub fn new(scratch_dir: impl Into<PathBuf>) -> Result<Self, ObjectStoreError> {
            let scratch_dir = scratch_dir.into();
            std::fs::create_dir_all(&scratch_dir)?;
            Ok(Self {
                blobs: Arc::new(RwLock::new(HashMap::new())),
                scratch_dir,
                unavailable: Arc::new(AtomicBool::new(false)),
            })
        }

        /// Make every subsequent call fail with `Unavailable`
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Drop a blob behind the catalog's back
        pub fn evict(&self, key: &ObjectKey) -> Option<Bytes> {
            self.blobs.write().remove(key)
        }

        pub fn contains(&self, key: &ObjectKey) -> bool {
            self.blobs.read().contains_key(key)
        }

        pub fn len(&self) -> usize {
            self.blobs.read().len()
        }

        pub fn is_empty(&self) -> bool {
            self.blobs.read().is_empty()
        }

        fn check_available(&self) -> Result<(), ObjectStoreError> {
            if self.unavailable.load(Ordering::SeqCst) {
                Err(ObjectStoreError::Unavailable(
                    "in-memory store marked unavailable".to_string(),
                ))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ObjectStore for InMemoryObjectStore {
        async fn put(&self, key: &ObjectKey, local_path: &Path) -> Result<(), ObjectStoreError> {
            self.check_available()?;
            let content = tokio::fs::read(local_path).await?;
            self.blobs.write().insert(key.clone(), Bytes::from(content));
            Ok(())
        }

        async fn fetch_to_scratch(&self, key: &ObjectKey) -> Result<ScratchFile, ObjectStoreError> {
            self.check_available()?;
            let content = self
                .blobs
                .read()
                .get(key)
                .cloned()
                .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))?;

            let scratch = ScratchFile::reserve(&self.scratch_dir, key);
            tokio::fs::write(scratch.path(), &content).await?;
            Ok(scratch)
        }

        async fn delete(&self, key: &ObjectKey) -> Result<(), ObjectStoreError> {
            self.check_available()?;
            self.blobs.write().remove(key);
            Ok(())
        }

        async fn health_check(&self) -> Result<(), ObjectStoreError> {
            self.check_available()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::version::ObjectKey;
    use tempfile::TempDir;

    #[test]
    fn test_factory_local() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_object_store(
            &ObjectStoreBackend::Local {
                base_path: temp_dir.path().join("objects"),
            },
            temp_dir.path().join("scratch"),
        );
        assert!(store.is_ok());
    }

    #[test]
    fn test_factory_memory() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_object_store(&ObjectStoreBackend::Memory, temp_dir.path()).unwrap();
        assert_eq!(Arc::strong_count(&store), 1);
    }

    #[test]
    fn test_factory_propagates_construction_errors() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let result = create_object_store(
            &ObjectStoreBackend::Local {
                base_path: blocker.join("objects"),
            },
            temp_dir.path().join("scratch"),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let temp_dir = TempDir::new().unwrap();
        let store = InMemoryObjectStore::new(temp_dir.path()).unwrap();
        let staged = temp_dir.path().join("staged");
        std::fs::write(&staged, b"bark texture").unwrap();
        let key = ObjectKey::generate();

        store.put(&key, &staged).await.unwrap();
        assert!(store.contains(&key));

        store.set_unavailable(true);
        assert!(matches!(
            store.fetch_to_scratch(&key).await,
            Err(ObjectStoreError::Unavailable(_))
        ));
        assert!(store.health_check().await.is_err());

        store.set_unavailable(false);
        store.evict(&key);
        assert!(matches!(
            store.fetch_to_scratch(&key).await,
            Err(ObjectStoreError::NotFound(_))
        ));
    }
}
