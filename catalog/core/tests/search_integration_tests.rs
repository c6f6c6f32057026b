// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Asset listing: filters, sort modes and page windows.

use griddle_catalog_core::application::{
    AssetCatalogService, AssetQueryService, StandardAssetCatalogService,
    StandardAssetQueryService,
};
use griddle_catalog_core::domain::asset::{Asset, AssetId, NewAsset};
use griddle_catalog_core::domain::repository::VersionRepository;
use griddle_catalog_core::domain::search::{SortMode, PAGE_SIZE};
use griddle_catalog_core::domain::version::{NewVersion, ObjectKey, SemVer};
use griddle_catalog_core::infrastructure::event_bus::EventBus;
use griddle_catalog_core::infrastructure::repositories::InMemoryCatalogRepository;
use griddle_catalog_core::infrastructure::storage::InMemoryObjectStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    repo: InMemoryCatalogRepository,
    catalog: StandardAssetCatalogService,
    queries: StandardAssetQueryService,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let repo = InMemoryCatalogRepository::new();
    let store = InMemoryObjectStore::new(dir.path()).unwrap();
    Fixture {
        catalog: StandardAssetCatalogService::new(
            Arc::new(repo.clone()),
            Arc::new(store),
            Arc::new(EventBus::default()),
        ),
        queries: StandardAssetQueryService::new(Arc::new(repo.clone()), Arc::new(repo.clone())),
        repo,
        _dir: dir,
    }
}

impl Fixture {
    async fn asset(&self, name: &str, keywords: &str, author: &str) -> Asset {
        self.catalog
            .create_asset(
                author,
                NewAsset {
                    name: name.to_string(),
                    keywords: keywords.to_string(),
                    image_uri: None,
                },
            )
            .await
            .unwrap()
    }

    /// Record a version row directly; search only looks at timestamps
    async fn version(&self, asset_id: AssetId, semver: SemVer) {
        self.repo
            .insert(NewVersion {
                asset_id,
                semver,
                author_id: "jdoe".to_string(),
                message: String::new(),
                object_key: ObjectKey::generate(),
            })
            .await
            .unwrap();
        // Keep creation timestamps strictly ordered
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    async fn names(&self, query: Option<&str>, sort: SortMode, offset: usize) -> Vec<String> {
        self.queries
            .search_assets(query, sort, offset)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect()
    }
}

#[tokio::test]
async fn test_date_sorts_put_unversioned_assets_last() {
    let f = fixture();
    let older = f.asset("Older", "", "jdoe").await;
    let newer = f.asset("Newer", "", "jdoe").await;
    f.asset("Empty", "", "jdoe").await;

    f.version(older.id, SemVer::INITIAL).await;
    f.version(newer.id, SemVer::INITIAL).await;

    assert_eq!(
        f.names(None, SortMode::DateDescending, 0).await,
        ["Newer", "Older", "Empty"]
    );
    assert_eq!(
        f.names(None, SortMode::DateAscending, 0).await,
        ["Older", "Newer", "Empty"]
    );
}

#[tokio::test]
async fn test_date_sort_uses_latest_version() {
    let f = fixture();
    let a = f.asset("A", "", "jdoe").await;
    let b = f.asset("B", "", "jdoe").await;

    f.version(a.id, SemVer::new(0, 1)).await;
    f.version(b.id, SemVer::new(0, 1)).await;
    // A gets a fresher version than B
    f.version(a.id, SemVer::new(0, 2)).await;

    assert_eq!(f.names(None, SortMode::DateDescending, 0).await, ["A", "B"]);
}

#[tokio::test]
async fn test_name_sorts_are_bytewise() {
    let f = fixture();
    for name in ["birch", "Oak_Tree", "Ash", "aspen"] {
        f.asset(name, "", "jdoe").await;
    }

    assert_eq!(
        f.names(None, SortMode::NameAscending, 0).await,
        ["Ash", "Oak_Tree", "aspen", "birch"]
    );
    assert_eq!(
        f.names(None, SortMode::NameDescending, 0).await,
        ["birch", "aspen", "Oak_Tree", "Ash"]
    );
    assert_eq!(
        f.queries.list_asset_names().await.unwrap(),
        ["Ash", "Oak_Tree", "aspen", "birch"]
    );
}

#[tokio::test]
async fn test_pages_hold_twenty_four_assets() {
    let f = fixture();
    for i in 0..30 {
        f.asset(&format!("asset-{:02}", i), "bulk", "jdoe").await;
    }

    let first = f.names(Some("bulk"), SortMode::NameAscending, 0).await;
    let second = f.names(Some("bulk"), SortMode::NameAscending, PAGE_SIZE).await;
    assert_eq!(first.len(), PAGE_SIZE);
    assert_eq!(second.len(), 30 - PAGE_SIZE);
    assert_eq!(first[0], "asset-00");
    assert_eq!(second[0], "asset-24");

    // Offsets are item offsets, not page numbers
    let shifted = f.names(Some("bulk"), SortMode::NameAscending, 1).await;
    assert_eq!(shifted[0], "asset-01");

    assert!(f
        .names(Some("bulk"), SortMode::NameAscending, 30)
        .await
        .is_empty());
}

#[tokio::test]
async fn test_matching_rules() {
    let f = fixture();
    f.asset("Oak_Tree", "plant forest", "jdoe").await;
    f.asset("Bark", "tree bark", "jdoe").await;
    f.asset("Rock", "stone", "mwilliams").await;

    let sorted = SortMode::NameAscending;
    assert_eq!(f.names(Some("plant"), sorted, 0).await, ["Oak_Tree"]);
    assert_eq!(f.names(Some("forest tree"), sorted, 0).await, ["Bark", "Oak_Tree"]);
    assert_eq!(f.names(Some("forest, tree"), sorted, 0).await, ["Bark", "Oak_Tree"]);
    assert_eq!(f.names(Some("WILLIAMS"), sorted, 0).await, ["Rock"]);
    assert!(f.names(Some("nonexistent"), sorted, 0).await.is_empty());
    assert_eq!(f.names(Some(""), sorted, 0).await.len(), 3);
    assert_eq!(f.names(None, sorted, 0).await.len(), 3);
}
