// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::version::Version;

/// How many versions the asset detail view carries.
pub const DETAIL_VERSION_COUNT: usize = 3;

/// Unique identifier for an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub Uuid);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named creative work tracked by the catalog.
///
/// `id` and `author_id` are fixed at creation; only the descriptive metadata
/// can change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    /// Free-text keyword string, matched token by token during search
    pub keywords: String,
    pub image_uri: Option<String>,
    pub author_id: String,
}

impl Asset {
    /// Create a new asset with a freshly generated identifier
    pub fn new(author_id: impl Into<String>, metadata: NewAsset) -> Self {
        Self {
            id: AssetId::new(),
            name: metadata.name,
            keywords: metadata.keywords,
            image_uri: metadata.image_uri,
            author_id: author_id.into(),
        }
    }

    /// Replace the mutable metadata, leaving identity and authorship intact
    pub fn apply_update(&mut self, update: AssetUpdate) {
        self.name = update.name;
        self.keywords = update.keywords;
        self.image_uri = update.image_uri;
    }
}

/// Metadata supplied when creating an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAsset {
    pub name: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub image_uri: Option<String>,
}

/// Metadata supplied when updating an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUpdate {
    pub name: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub image_uri: Option<String>,
}

/// Asset plus its most recently created versions (newest first)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDetail {
    pub asset: Asset,
    pub versions: Vec<Version>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_preserves_identity() {
        let mut asset = Asset::new(
            "jdoe",
            NewAsset {
                name: "Oak_Tree".to_string(),
                keywords: "plant forest".to_string(),
                image_uri: None,
            },
        );
        let id = asset.id;

        asset.apply_update(AssetUpdate {
            name: "Oak_Tree_Large".to_string(),
            keywords: "plant".to_string(),
            image_uri: Some("s3://covers/oak.png".to_string()),
        });

        assert_eq!(asset.id, id);
        assert_eq!(asset.author_id, "jdoe");
        assert_eq!(asset.name, "Oak_Tree_Large");
        assert_eq!(asset.image_uri.as_deref(), Some("s3://covers/oak.png"));
    }

    #[test]
    fn test_asset_id_parsing() {
        let id = AssetId::new();
        assert_eq!(AssetId::from_string(&id.to_string()).unwrap(), id);
        assert!(AssetId::from_string("not-a-uuid").is_err());
    }
}
