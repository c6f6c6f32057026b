// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod artifact_lifecycle;
pub mod asset_catalog;
pub mod asset_query;
pub mod error;
pub mod repository_factory;

pub use artifact_lifecycle::{
    ArtifactService, ContentStream, StandardArtifactService, UploadRequest, VersionDownload,
};
pub use asset_catalog::{AssetCatalogService, StandardAssetCatalogService};
pub use asset_query::{AssetQueryService, StandardAssetQueryService};
pub use error::{CatalogError, Result};
