// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! S3-Compatible Object Store
//!
//! Production [`ObjectStore`] backed by an S3 bucket (AWS, MinIO, Ceph RGW,
//! ...) through an `opendal` operator. Uploads are streamed from the staged
//! file in fixed-size chunks.

use async_trait::async_trait;
use opendal::{services, ErrorKind, Operator};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::domain::storage::{ObjectStore, ObjectStoreError, ScratchFile};
use crate::domain::version::ObjectKey;

/// Upload chunk size; S3 multipart parts must be at least 5 MiB
const CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Connection settings for an S3 bucket
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

pub struct S3ObjectStore {
    operator: Operator,
    bucket: String,
    scratch_dir: PathBuf,
}

impl S3ObjectStore {
    pub fn new(
        settings: S3Settings,
        scratch_dir: impl Into<PathBuf>,
    ) -> Result<Self, ObjectStoreError> {
        let scratch_dir = scratch_dir.into();
        std::fs::create_dir_all(&scratch_dir)?;

        let mut builder = services::S3::default()
            .bucket(&settings.bucket)
            .region(&settings.region);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let Some(key_id) = &settings.access_key_id {
            builder = builder.access_key_id(key_id);
        }
        if let Some(secret) = &settings.secret_access_key {
            builder = builder.secret_access_key(secret);
        }

        let operator = Operator::new(builder)?.finish();

        info!(
            "Configured S3 object store (bucket={}, endpoint={})",
            settings.bucket,
            settings.endpoint.as_deref().unwrap_or("aws default")
        );

        Ok(Self {
            operator,
            bucket: settings.bucket,
            scratch_dir,
        })
    }

    async fn upload(&self, key: &ObjectKey, local_path: &Path) -> Result<u64, ObjectStoreError> {
        let mut file = tokio::fs::File::open(local_path).await?;
        let mut writer = self.operator.writer(key.as_str()).await?;
        let mut total = 0u64;

        loop {
            let mut chunk = Vec::with_capacity(CHUNK_SIZE);
            let read = (&mut file)
                .take(CHUNK_SIZE as u64)
                .read_to_end(&mut chunk)
                .await?;
            if read == 0 {
                break;
            }
            total += read as u64;
            if let Err(e) = writer.write(chunk).await {
                let _ = writer.abort().await;
                return Err(e.into());
            }
        }

        writer.close().await?;
        Ok(total)
    }
}

impl From<opendal::Error> for ObjectStoreError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound => ObjectStoreError::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => ObjectStoreError::PermissionDenied(err.to_string()),
            _ => ObjectStoreError::Unavailable(err.to_string()),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &ObjectKey, local_path: &Path) -> Result<(), ObjectStoreError> {
        let bytes = self.upload(key, local_path).await?;
        debug!("Uploaded {} bytes to s3://{}/{}", bytes, self.bucket, key);
        Ok(())
    }

    async fn fetch_to_scratch(&self, key: &ObjectKey) -> Result<ScratchFile, ObjectStoreError> {
        let buffer = self.operator.read(key.as_str()).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ObjectStoreError::NotFound(key.to_string())
            } else {
                e.into()
            }
        })?;

        let scratch = ScratchFile::reserve(&self.scratch_dir, key);
        tokio::fs::write(scratch.path(), buffer.to_bytes()).await?;
        debug!("Fetched s3://{}/{} to {}", self.bucket, key, scratch.path().display());
        Ok(scratch)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), ObjectStoreError> {
        self.operator.delete(key.as_str()).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ObjectStoreError> {
        self.operator.check().await?;
        Ok(())
    }
}
