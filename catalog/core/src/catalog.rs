// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Catalog runtime
//!
//! [`Catalog`] owns every long-lived resource: the database pool, the
//! repositories, the object store, the event bus and the three application
//! services. Nothing is global; callers build a `Catalog` from a
//! [`CatalogConfig`], hand its services to the transport layer and call
//! [`Catalog::shutdown`] on exit.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::application::repository_factory::create_catalog_repositories;
use crate::application::{
    ArtifactService, AssetCatalogService, AssetQueryService, StandardArtifactService,
    StandardAssetCatalogService, StandardAssetQueryService,
};
use crate::domain::config::CatalogConfig;
use crate::domain::repository::StorageBackend;
use crate::domain::storage::ObjectStore;
use crate::infrastructure::db::Database;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::storage::create_object_store;

pub struct Catalog {
    pub artifacts: Arc<dyn ArtifactService>,
    pub queries: Arc<dyn AssetQueryService>,
    pub assets: Arc<dyn AssetCatalogService>,
    pub event_bus: Arc<EventBus>,
    pub object_store: Arc<dyn ObjectStore>,
    database: Option<Database>,
}

impl Catalog {
    /// Build all catalog components from configuration.
    ///
    /// Connects to and migrates PostgreSQL when a database is configured,
    /// and fails if the object store does not pass its health check.
    pub async fn start(config: &CatalogConfig) -> Result<Self> {
        config.validate()?;
        crate::telemetry::init_metrics(&config.metrics)?;

        let backend = config.storage_backend();
        let database = match &backend {
            StorageBackend::PostgreSQL(pg) => {
                let db = Database::new(pg).await?;
                db.migrate().await?;
                info!("Connected to PostgreSQL");
                Some(db)
            }
            StorageBackend::InMemory => {
                info!("No database configured, using in-memory repositories");
                None
            }
        };

        let repos = create_catalog_repositories(&backend, database.as_ref())?;

        let scratch_dir = config.scratch_dir();
        let object_store = create_object_store(&config.object_store, &scratch_dir)
            .context("Failed to create object store")?;
        object_store
            .health_check()
            .await
            .context("Object store health check failed")?;

        let event_bus = Arc::new(EventBus::with_default_capacity());

        let artifacts = Arc::new(StandardArtifactService::new(
            repos.assets.clone(),
            repos.versions.clone(),
            object_store.clone(),
            event_bus.clone(),
            scratch_dir.clone(),
        ));
        let queries = Arc::new(StandardAssetQueryService::new(
            repos.assets.clone(),
            repos.versions.clone(),
        ));
        let assets = Arc::new(StandardAssetCatalogService::new(
            repos.assets,
            object_store.clone(),
            event_bus.clone(),
        ));

        info!("Catalog started (scratch dir {})", scratch_dir.display());

        Ok(Self {
            artifacts,
            queries,
            assets,
            event_bus,
            object_store,
            database,
        })
    }

    /// Release the database pool
    pub async fn shutdown(self) {
        if let Some(db) = &self.database {
            db.close().await;
        }
        info!("Catalog shut down");
    }
}
