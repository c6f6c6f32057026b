// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Asset Query Application Service
//!
//! Read side of the catalog: filtered, sorted, paginated asset listings, the
//! asset detail view and the flat name listing.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::application::error::{CatalogError, Result};
use crate::domain::asset::{Asset, AssetDetail, AssetId, DETAIL_VERSION_COUNT};
use crate::domain::repository::{AssetRepository, VersionRepository};
use crate::domain::search::{AssetSearch, SortMode};
use crate::domain::version::VersionOrder;

#[async_trait]
pub trait AssetQueryService: Send + Sync {
    /// One page of assets matching `query`, ordered by `sort`
    async fn search_assets(
        &self,
        query: Option<&str>,
        sort: SortMode,
        offset: usize,
    ) -> Result<Vec<Asset>>;

    /// The asset plus its most recent versions, newest first
    async fn asset_detail(&self, asset_id: AssetId) -> Result<AssetDetail>;

    /// Every asset name, ascending
    async fn list_asset_names(&self) -> Result<Vec<String>>;
}

pub struct StandardAssetQueryService {
    assets: Arc<dyn AssetRepository>,
    versions: Arc<dyn VersionRepository>,
}

impl StandardAssetQueryService {
    pub fn new(assets: Arc<dyn AssetRepository>, versions: Arc<dyn VersionRepository>) -> Self {
        Self { assets, versions }
    }
}

#[async_trait]
impl AssetQueryService for StandardAssetQueryService {
    async fn search_assets(
        &self,
        query: Option<&str>,
        sort: SortMode,
        offset: usize,
    ) -> Result<Vec<Asset>> {
        let search = AssetSearch::page(query, sort, offset);
        debug!(
            "Searching assets (tokens={:?}, sort={:?}, offset={})",
            search.query.as_ref().map(|q| q.tokens()),
            sort,
            offset
        );
        Ok(self.assets.search(&search).await?)
    }

    async fn asset_detail(&self, asset_id: AssetId) -> Result<AssetDetail> {
        let asset = self
            .assets
            .find_by_id(asset_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Asset {}", asset_id)))?;

        let versions = self
            .versions
            .list_for_asset(asset_id, VersionOrder::Descending, 0, DETAIL_VERSION_COUNT)
            .await?;

        Ok(AssetDetail { asset, versions })
    }

    async fn list_asset_names(&self) -> Result<Vec<String>> {
        Ok(self.assets.list_names().await?)
    }
}
