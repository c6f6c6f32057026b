// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Asset Catalog Application Service
//!
//! Metadata lifecycle for assets. Creating an asset stores metadata only;
//! content arrives through the artifact service. Deleting an asset removes
//! its versions and then, best-effort, their blobs.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::error::{CatalogError, Result};
use crate::domain::asset::{Asset, AssetId, AssetUpdate, NewAsset};
use crate::domain::events::CatalogEvent;
use crate::domain::repository::AssetRepository;
use crate::domain::storage::ObjectStore;
use crate::infrastructure::event_bus::EventBus;

#[async_trait]
pub trait AssetCatalogService: Send + Sync {
    async fn create_asset(&self, author_id: &str, metadata: NewAsset) -> Result<Asset>;

    async fn update_asset(&self, asset_id: AssetId, update: AssetUpdate) -> Result<Asset>;

    async fn delete_asset(&self, asset_id: AssetId) -> Result<()>;

    async fn asset_exists(&self, asset_id: AssetId) -> Result<bool>;
}

pub struct StandardAssetCatalogService {
    assets: Arc<dyn AssetRepository>,
    store: Arc<dyn ObjectStore>,
    event_bus: Arc<EventBus>,
}

impl StandardAssetCatalogService {
    pub fn new(
        assets: Arc<dyn AssetRepository>,
        store: Arc<dyn ObjectStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            assets,
            store,
            event_bus,
        }
    }
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CatalogError::InvalidInput("Asset name cannot be empty".to_string()));
    }
    Ok(())
}

#[async_trait]
impl AssetCatalogService for StandardAssetCatalogService {
    async fn create_asset(&self, author_id: &str, metadata: NewAsset) -> Result<Asset> {
        require_name(&metadata.name)?;

        let asset = Asset::new(author_id, metadata);
        self.assets.insert(&asset).await?;

        self.event_bus.publish(CatalogEvent::AssetCreated {
            asset_id: asset.id,
            name: asset.name.clone(),
            author_id: asset.author_id.clone(),
            created_at: Utc::now(),
        });

        info!("Created asset {} ({})", asset.name, asset.id);
        Ok(asset)
    }

    async fn update_asset(&self, asset_id: AssetId, update: AssetUpdate) -> Result<Asset> {
        require_name(&update.name)?;

        let mut asset = self
            .assets
            .find_by_id(asset_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Asset {}", asset_id)))?;

        asset.apply_update(update);
        self.assets.update(&asset).await?;

        self.event_bus.publish(CatalogEvent::AssetUpdated {
            asset_id,
            name: asset.name.clone(),
            updated_at: Utc::now(),
        });

        info!("Updated asset {}", asset_id);
        Ok(asset)
    }

    async fn delete_asset(&self, asset_id: AssetId) -> Result<()> {
        info!("Deleting asset {}", asset_id);

        let keys = self.assets.delete(asset_id).await?;

        for key in &keys {
            match self.store.delete(key).await {
                Ok(()) => debug!("Deleted blob {}", key),
                Err(e) => warn!(
                    "Failed to delete blob {} of asset {} (left orphaned): {}",
                    key, asset_id, e
                ),
            }
        }

        self.event_bus.publish(CatalogEvent::AssetDeleted {
            asset_id,
            version_count: keys.len(),
            deleted_at: Utc::now(),
        });

        info!("Deleted asset {} and {} versions", asset_id, keys.len());
        Ok(())
    }

    async fn asset_exists(&self, asset_id: AssetId) -> Result<bool> {
        Ok(self.assets.exists(asset_id).await?)
    }
}
