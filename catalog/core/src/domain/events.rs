// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::asset::AssetId;
use crate::domain::version::{ObjectKey, SemVer};

/// Catalog lifecycle events published on the event bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEvent {
    AssetCreated {
        asset_id: AssetId,
        name: String,
        author_id: String,
        created_at: DateTime<Utc>,
    },
    AssetUpdated {
        asset_id: AssetId,
        name: String,
        updated_at: DateTime<Utc>,
    },
    AssetDeleted {
        asset_id: AssetId,
        /// Versions removed along with the asset
        version_count: usize,
        deleted_at: DateTime<Utc>,
    },
    VersionPublished {
        asset_id: AssetId,
        semver: SemVer,
        author_id: String,
        object_key: ObjectKey,
        size_bytes: u64,
        published_at: DateTime<Utc>,
    },
    VersionDownloaded {
        asset_id: AssetId,
        semver: SemVer,
        downloaded_at: DateTime<Utc>,
    },
}

impl CatalogEvent {
    /// The asset this event concerns
    pub fn asset_id(&self) -> AssetId {
        match self {
            CatalogEvent::AssetCreated { asset_id, .. }
            | CatalogEvent::AssetUpdated { asset_id, .. }
            | CatalogEvent::AssetDeleted { asset_id, .. }
            | CatalogEvent::VersionPublished { asset_id, .. }
            | CatalogEvent::VersionDownloaded { asset_id, .. } => *asset_id,
        }
    }
}
