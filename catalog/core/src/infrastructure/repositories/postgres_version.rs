// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Version
//!
//! Version rows keyed by `(asset_id, semver)`. The semver is stored as its
//! `MAJOR.MINOR` text; numeric ordering in SQL goes through
//! `string_to_array(semver, '.')::int[]`.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::asset::AssetId;
use crate::domain::repository::{RepositoryError, VersionRepository};
use crate::domain::version::{NewVersion, ObjectKey, SemVer, Version, VersionOrder};

pub struct PostgresVersionRepository {
    pool: PgPool,
}

impl PostgresVersionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_version_row(row: PgRow) -> Result<Version, RepositoryError> {
    let semver: String = row.try_get("semver")?;
    let object_key: String = row.try_get("object_key")?;

    Ok(Version {
        asset_id: AssetId(row.try_get("asset_id")?),
        semver: semver.parse()?,
        author_id: row.try_get("author_id")?,
        created_at: row.try_get("created_at")?,
        message: row.try_get("message")?,
        object_key: ObjectKey::parse(object_key)?,
    })
}

#[async_trait]
impl VersionRepository for PostgresVersionRepository {
    async fn insert(&self, version: NewVersion) -> Result<Version, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO versions (asset_id, semver, author_id, message, object_key)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING asset_id, semver, author_id, created_at, message, object_key
            "#,
        )
        .bind(version.asset_id.0)
        .bind(version.semver.to_string())
        .bind(&version.author_id)
        .bind(&version.message)
        .bind(version.object_key.as_str())
        .fetch_one(&self.pool)
        .await?;

        parse_version_row(row)
    }

    async fn find(
        &self,
        asset_id: AssetId,
        semver: SemVer,
    ) -> Result<Option<Version>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT asset_id, semver, author_id, created_at, message, object_key
            FROM versions
            WHERE asset_id = $1 AND semver = $2
            "#,
        )
        .bind(asset_id.0)
        .bind(semver.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(parse_version_row).transpose()
    }

    async fn list_semvers(&self, asset_id: AssetId) -> Result<Vec<SemVer>, RepositoryError> {
        let rows = sqlx::query("SELECT semver FROM versions WHERE asset_id = $1")
            .bind(asset_id.0)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> Result<SemVer, RepositoryError> {
                let semver: String = row.try_get("semver")?;
                Ok(semver.parse()?)
            })
            .collect()
    }

    async fn list_for_asset(
        &self,
        asset_id: AssetId,
        order: VersionOrder,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Version>, RepositoryError> {
        let query = match order {
            VersionOrder::Ascending => {
                r#"
                SELECT asset_id, semver, author_id, created_at, message, object_key
                FROM versions
                WHERE asset_id = $1
                ORDER BY created_at ASC, string_to_array(semver, '.')::int[] ASC
                LIMIT $2 OFFSET $3
                "#
            }
            VersionOrder::Descending => {
                r#"
                SELECT asset_id, semver, author_id, created_at, message, object_key
                FROM versions
                WHERE asset_id = $1
                ORDER BY created_at DESC, string_to_array(semver, '.')::int[] DESC
                LIMIT $2 OFFSET $3
                "#
            }
        };

        let rows = sqlx::query(query)
            .bind(asset_id.0)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(parse_version_row).collect()
    }
}
