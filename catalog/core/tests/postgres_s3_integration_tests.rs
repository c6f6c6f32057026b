// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Round trips against real backends.
//!
//! Ignored by default. Run with
//! `DATABASE_URL=postgres://... cargo test -- --ignored` for PostgreSQL and
//! additionally `AWS_ENDPOINT_URL`, `AWS_ACCESS_KEY_ID`,
//! `AWS_SECRET_ACCESS_KEY` for an S3-compatible bucket named
//! `griddle-assets`.

use griddle_catalog_core::application::{CatalogError, UploadRequest};
use griddle_catalog_core::domain::asset::NewAsset;
use griddle_catalog_core::domain::config::{CatalogConfig, ObjectStoreBackend, DEFAULT_BUCKET};
use griddle_catalog_core::domain::search::SortMode;
use griddle_catalog_core::domain::storage::{ObjectStore, ObjectStoreError};
use griddle_catalog_core::domain::version::{BumpKind, ObjectKey, SemVer};
use griddle_catalog_core::infrastructure::storage::{S3ObjectStore, S3Settings};
use griddle_catalog_core::Catalog;
use tempfile::TempDir;

/// Local blobs unless `AWS_ENDPOINT_URL` switches the store to S3
fn postgres_config(dir: &TempDir) -> Option<CatalogConfig> {
    std::env::var("DATABASE_URL").ok()?;

    let mut config = CatalogConfig {
        object_store: ObjectStoreBackend::Local {
            base_path: dir.path().join("objects"),
        },
        scratch_dir: Some(dir.path().join("scratch")),
        ..CatalogConfig::default()
    };
    config.apply_env_overrides();
    Some(config)
}

#[tokio::test]
#[ignore]
async fn test_postgres_upload_search_download() {
    let dir = TempDir::new().unwrap();
    let Some(config) = postgres_config(&dir) else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let catalog = Catalog::start(&config).await.unwrap();

    let name = format!("Oak_Tree_{}", uuid::Uuid::new_v4().simple());
    let oak = catalog
        .assets
        .create_asset(
            "jdoe",
            NewAsset {
                name: name.clone(),
                keywords: "plant forest".to_string(),
                image_uri: None,
            },
        )
        .await
        .unwrap();

    let mut last = SemVer::INITIAL;
    for (i, bump) in [BumpKind::Minor; 10].into_iter().enumerate() {
        let version = catalog
            .artifacts
            .upload_version(UploadRequest {
                asset_id: oak.id,
                author_id: "jdoe".to_string(),
                content: Box::new(std::io::Cursor::new(format!("mesh {}", i).into_bytes())),
                message: String::new(),
                bump,
            })
            .await
            .unwrap();
        last = version.semver;
    }
    // Numeric, not lexical: 0.10 follows 0.9
    assert_eq!(last, SemVer::new(0, 10));

    let hits = catalog
        .queries
        .search_assets(Some(name.as_str()), SortMode::DateDescending, 0)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);

    let detail = catalog.queries.asset_detail(oak.id).await.unwrap();
    let semvers: Vec<String> = detail.versions.iter().map(|v| v.semver.to_string()).collect();
    assert_eq!(semvers, ["0.10", "0.9", "0.8"]);

    let download = catalog
        .artifacts
        .download_version(oak.id, SemVer::new(0, 10))
        .await
        .unwrap();
    assert_eq!(std::fs::read(download.file.path()).unwrap(), b"mesh 9");
    download.release();

    assert!(matches!(
        catalog.artifacts.download_version(oak.id, SemVer::new(7, 0)).await,
        Err(CatalogError::NotFound(_))
    ));

    catalog.assets.delete_asset(oak.id).await.unwrap();
    assert!(!catalog.assets.asset_exists(oak.id).await.unwrap());

    catalog.shutdown().await;
}

#[tokio::test]
#[ignore]
async fn test_s3_put_fetch_delete() {
    let Ok(endpoint) = std::env::var("AWS_ENDPOINT_URL") else {
        eprintln!("AWS_ENDPOINT_URL not set, skipping");
        return;
    };
    let dir = TempDir::new().unwrap();
    let store = S3ObjectStore::new(
        S3Settings {
            bucket: DEFAULT_BUCKET.to_string(),
            endpoint: Some(endpoint),
            region: "us-east-1".to_string(),
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
        },
        dir.path().join("scratch"),
    )
    .unwrap();
    store.health_check().await.unwrap();

    let staged = dir.path().join("staged.bin");
    std::fs::write(&staged, b"bark texture").unwrap();
    let key = ObjectKey::generate();

    store.put(&key, &staged).await.unwrap();
    let scratch = store.fetch_to_scratch(&key).await.unwrap();
    assert_eq!(std::fs::read(scratch.path()).unwrap(), b"bark texture");
    scratch.release();

    store.delete(&key).await.unwrap();
    assert!(matches!(
        store.fetch_to_scratch(&key).await,
        Err(ObjectStoreError::NotFound(_))
    ));
}
