// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for the catalog. The interfaces live in the domain
//! layer and are implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Records | Implementations |
//! |-------|---------|----------------|
//! | `AssetRepository` | `Asset` | `InMemoryCatalogRepository`, `PostgresAssetRepository` |
//! | `VersionRepository` | `Version` | `InMemoryCatalogRepository`, `PostgresVersionRepository` |
//!
//! ## Storage Backend Abstraction
//!
//! Concrete implementations are selected at catalog startup from
//! configuration (`griddle-config.yaml`). In-memory implementations are used
//! for development and testing, PostgreSQL for production.

use async_trait::async_trait;

use crate::domain::asset::{Asset, AssetId};
use crate::domain::search::AssetSearch;
use crate::domain::version::{NewVersion, ObjectKey, SemVer, Version, VersionOrder};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

/// Repository interface for Asset records
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Insert a new asset
    async fn insert(&self, asset: &Asset) -> Result<(), RepositoryError>;

    /// Overwrite an existing asset's metadata. `NotFound` if it is absent.
    async fn update(&self, asset: &Asset) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: AssetId) -> Result<Option<Asset>, RepositoryError>;

    async fn exists(&self, id: AssetId) -> Result<bool, RepositoryError>;

    /// Filter, sort and page assets in a single pass
    async fn search(&self, search: &AssetSearch) -> Result<Vec<Asset>, RepositoryError>;

    /// All asset names, ascending
    async fn list_names(&self) -> Result<Vec<String>, RepositoryError>;

    /// Hard delete an asset together with its versions.
    ///
    /// Returns the object keys of the deleted versions so their blobs can be
    /// removed. `NotFound` if the asset is absent.
    async fn delete(&self, id: AssetId) -> Result<Vec<ObjectKey>, RepositoryError>;
}

/// Repository interface for Version records. Versions are append-only.
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// Insert a version row; the store assigns `created_at`.
    ///
    /// `Conflict` if `(asset_id, semver)` or the object key is taken,
    /// `NotFound` if the asset does not exist.
    async fn insert(&self, version: NewVersion) -> Result<Version, RepositoryError>;

    async fn find(
        &self,
        asset_id: AssetId,
        semver: SemVer,
    ) -> Result<Option<Version>, RepositoryError>;

    /// Every semver recorded for the asset, in no particular order
    async fn list_semvers(&self, asset_id: AssetId) -> Result<Vec<SemVer>, RepositoryError>;

    /// Version history window ordered by creation time then semver
    async fn list_for_asset(
        &self,
        asset_id: AssetId,
        order: VersionOrder,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Version>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                RepositoryError::NotFound(db_err.message().to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<crate::domain::version::SemVerParseError> for RepositoryError {
    fn from(err: crate::domain::version::SemVerParseError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<crate::domain::version::InvalidObjectKey> for RepositoryError {
    fn from(err: crate::domain::version::InvalidObjectKey) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
