// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository implementations based on storage backend
//! configuration, keeping the domain layer free of infrastructure choices.

use std::sync::Arc;

use crate::domain::repository::{AssetRepository, StorageBackend, VersionRepository};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::{
    InMemoryCatalogRepository, PostgresAssetRepository, PostgresVersionRepository,
};

/// Asset and version repositories sharing one backend
#[derive(Clone)]
pub struct CatalogRepositories {
    pub assets: Arc<dyn AssetRepository>,
    pub versions: Arc<dyn VersionRepository>,
}

/// Creates the catalog repositories for the configured backend.
///
/// The in-memory backend uses one shared store for both traits so asset
/// deletes cascade and date sorts see version timestamps.
pub fn create_catalog_repositories(
    backend: &StorageBackend,
    database: Option<&Database>,
) -> anyhow::Result<CatalogRepositories> {
    match (backend, database) {
        (StorageBackend::InMemory, _) => {
            let repo = InMemoryCatalogRepository::new();
            Ok(CatalogRepositories {
                assets: Arc::new(repo.clone()),
                versions: Arc::new(repo),
            })
        }
        (StorageBackend::PostgreSQL(_), Some(db)) => Ok(CatalogRepositories {
            assets: Arc::new(PostgresAssetRepository::new(db.get_pool().clone())),
            versions: Arc::new(PostgresVersionRepository::new(db.get_pool().clone())),
        }),
        (StorageBackend::PostgreSQL(_), None) => {
            anyhow::bail!("PostgreSQL backend selected but no database connection was provided")
        }
    }
}
