// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository abstractions defined in
//! `crate::domain::repository`.
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresAssetRepository** - asset metadata, search and name listing
//! - **PostgresVersionRepository** - version rows and history
//!
//! ## In-Memory Repository
//!
//! - **InMemoryCatalogRepository** - a single HashMap-backed store that
//!   implements both traits, so date sorting can see version timestamps and
//!   deleting an asset cascades to its versions.

pub mod postgres_asset;
pub mod postgres_version;

pub use postgres_asset::PostgresAssetRepository;
pub use postgres_version::PostgresVersionRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::asset::{Asset, AssetId};
use crate::domain::repository::{AssetRepository, RepositoryError, VersionRepository};
use crate::domain::search::AssetSearch;
use crate::domain::version::{NewVersion, ObjectKey, SemVer, Version, VersionOrder};

#[derive(Default)]
struct CatalogState {
    assets: HashMap<AssetId, Asset>,
    versions: HashMap<(AssetId, SemVer), Version>,
}

impl CatalogState {
    /// Most recent version timestamp per asset, in one pass over the versions
    fn latest_version_times(&self) -> HashMap<AssetId, DateTime<Utc>> {
        let mut latest: HashMap<AssetId, DateTime<Utc>> = HashMap::new();
        for version in self.versions.values() {
            latest
                .entry(version.asset_id)
                .and_modify(|at| *at = (*at).max(version.created_at))
                .or_insert(version.created_at);
        }
        latest
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCatalogRepository {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetRepository for InMemoryCatalogRepository {
    async fn insert(&self, asset: &Asset) -> Result<(), RepositoryError> {
        let mut state = self.state.write();
        if state.assets.contains_key(&asset.id) {
            return Err(RepositoryError::Conflict(format!(
                "Asset {} already exists",
                asset.id
            )));
        }
        state.assets.insert(asset.id, asset.clone());
        Ok(())
    }

    async fn update(&self, asset: &Asset) -> Result<(), RepositoryError> {
        let mut state = self.state.write();
        match state.assets.get_mut(&asset.id) {
            Some(existing) => {
                *existing = asset.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!("Asset {}", asset.id))),
        }
    }

    async fn find_by_id(&self, id: AssetId) -> Result<Option<Asset>, RepositoryError> {
        Ok(self.state.read().assets.get(&id).cloned())
    }

    async fn exists(&self, id: AssetId) -> Result<bool, RepositoryError> {
        Ok(self.state.read().assets.contains_key(&id))
    }

    async fn search(&self, search: &AssetSearch) -> Result<Vec<Asset>, RepositoryError> {
        let state = self.state.read();
        let latest = state.latest_version_times();

        let mut matched: Vec<(&Asset, Option<DateTime<Utc>>)> = state
            .assets
            .values()
            .filter(|asset| search.matches(asset))
            .map(|asset| (asset, latest.get(&asset.id).copied()))
            .collect();

        matched.sort_by(|(a, latest_a), (b, latest_b)| {
            search.sort.compare(a, *latest_a, b, *latest_b)
        });

        Ok(matched
            .into_iter()
            .skip(search.offset)
            .take(search.limit)
            .map(|(asset, _)| asset.clone())
            .collect())
    }

    async fn list_names(&self) -> Result<Vec<String>, RepositoryError> {
        let mut names: Vec<String> = self
            .state
            .read()
            .assets
            .values()
            .map(|a| a.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, id: AssetId) -> Result<Vec<ObjectKey>, RepositoryError> {
        let mut state = self.state.write();
        if state.assets.remove(&id).is_none() {
            return Err(RepositoryError::NotFound(format!("Asset {}", id)));
        }

        let mut keys = Vec::new();
        state.versions.retain(|(asset_id, _), version| {
            if *asset_id == id {
                keys.push(version.object_key.clone());
                false
            } else {
                true
            }
        });
        Ok(keys)
    }
}

#[async_trait]
impl VersionRepository for InMemoryCatalogRepository {
    async fn insert(&self, version: NewVersion) -> Result<Version, RepositoryError> {
        let mut state = self.state.write();

        if !state.assets.contains_key(&version.asset_id) {
            return Err(RepositoryError::NotFound(format!("Asset {}", version.asset_id)));
        }
        let id = (version.asset_id, version.semver);
        if state.versions.contains_key(&id) {
            return Err(RepositoryError::Conflict(format!(
                "Version {} of asset {} already exists",
                version.semver, version.asset_id
            )));
        }
        if state
            .versions
            .values()
            .any(|v| v.object_key == version.object_key)
        {
            return Err(RepositoryError::Conflict(format!(
                "Object key {} already referenced",
                version.object_key
            )));
        }

        let version = version.into_version(Utc::now());
        state.versions.insert(id, version.clone());
        Ok(version)
    }

    async fn find(
        &self,
        asset_id: AssetId,
        semver: SemVer,
    ) -> Result<Option<Version>, RepositoryError> {
        Ok(self.state.read().versions.get(&(asset_id, semver)).cloned())
    }

    async fn list_semvers(&self, asset_id: AssetId) -> Result<Vec<SemVer>, RepositoryError> {
        Ok(self
            .state
            .read()
            .versions
            .keys()
            .filter(|(id, _)| *id == asset_id)
            .map(|(_, semver)| *semver)
            .collect())
    }

    async fn list_for_asset(
        &self,
        asset_id: AssetId,
        order: VersionOrder,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Version>, RepositoryError> {
        let state = self.state.read();
        let mut versions: Vec<&Version> = state
            .versions
            .values()
            .filter(|v| v.asset_id == asset_id)
            .collect();
        versions.sort_by(|a, b| a.cmp_history(b, order));

        Ok(versions
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
