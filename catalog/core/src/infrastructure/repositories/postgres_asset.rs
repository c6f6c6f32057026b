// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Asset
//!
//! Asset metadata persistence plus the search query. Search predicates are
//! pushed into SQL as `ILIKE` patterns built from the same tokens the
//! in-memory matcher uses.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};

use crate::domain::asset::{Asset, AssetId};
use crate::domain::repository::{AssetRepository, RepositoryError};
use crate::domain::search::{AssetSearch, SortMode};
use crate::domain::version::ObjectKey;

pub struct PostgresAssetRepository {
    pool: PgPool,
}

impl PostgresAssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Wrap `term` as a substring `ILIKE` pattern, escaping wildcards
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn order_by(sort: SortMode) -> &'static str {
    match sort {
        SortMode::NameAscending => " ORDER BY a.name COLLATE \"C\" ASC, a.id ASC",
        SortMode::NameDescending => " ORDER BY a.name COLLATE \"C\" DESC, a.id ASC",
        SortMode::DateAscending => " ORDER BY lv.latest ASC NULLS LAST, a.id ASC",
        SortMode::DateDescending => " ORDER BY lv.latest DESC NULLS LAST, a.id ASC",
    }
}

fn parse_asset_row(row: PgRow) -> Result<Asset, RepositoryError> {
    Ok(Asset {
        id: AssetId(row.try_get("id")?),
        name: row.try_get("name")?,
        keywords: row.try_get("keywords")?,
        image_uri: row.try_get("image_uri")?,
        author_id: row.try_get("author_id")?,
    })
}

#[async_trait]
impl AssetRepository for PostgresAssetRepository {
    async fn insert(&self, asset: &Asset) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO assets (id, name, author_id, keywords, image_uri)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(asset.id.0)
        .bind(&asset.name)
        .bind(&asset.author_id)
        .bind(&asset.keywords)
        .bind(&asset.image_uri)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, asset: &Asset) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE assets
            SET name = $2, keywords = $3, image_uri = $4
            WHERE id = $1
            "#,
        )
        .bind(asset.id.0)
        .bind(&asset.name)
        .bind(&asset.keywords)
        .bind(&asset.image_uri)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Asset {}", asset.id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: AssetId) -> Result<Option<Asset>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, author_id, keywords, image_uri
            FROM assets
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(parse_asset_row).transpose()
    }

    async fn exists(&self, id: AssetId) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM assets WHERE id = $1) AS present")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("present")?)
    }

    async fn search(&self, search: &AssetSearch) -> Result<Vec<Asset>, RepositoryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT a.id, a.name, a.author_id, a.keywords, a.image_uri
            FROM assets a
            LEFT JOIN (
                SELECT asset_id, MAX(created_at) AS latest
                FROM versions
                GROUP BY asset_id
            ) lv ON lv.asset_id = a.id
            "#,
        );

        if let Some(query) = &search.query {
            let raw = contains_pattern(query.raw());
            let tokens: Vec<String> = query.tokens().iter().map(|t| contains_pattern(t)).collect();

            qb.push(" WHERE a.name ILIKE ");
            qb.push_bind(raw.clone());
            qb.push(" OR a.author_id ILIKE ");
            qb.push_bind(raw);
            if !tokens.is_empty() {
                qb.push(" OR a.name ILIKE ANY(");
                qb.push_bind(tokens.clone());
                qb.push(") OR a.keywords ILIKE ANY(");
                qb.push_bind(tokens);
                qb.push(")");
            }
        }

        qb.push(order_by(search.sort));
        qb.push(" LIMIT ");
        qb.push_bind(search.limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(search.offset as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(parse_asset_row).collect()
    }

    async fn list_names(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query(r#"SELECT name FROM assets ORDER BY name COLLATE "C" ASC"#)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| row.try_get("name").map_err(RepositoryError::from))
            .collect()
    }

    async fn delete(&self, id: AssetId) -> Result<Vec<ObjectKey>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the asset row so no version can be added between reading the
        // keys and the cascade
        let present = sqlx::query("SELECT id FROM assets WHERE id = $1 FOR UPDATE")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?;
        if present.is_none() {
            return Err(RepositoryError::NotFound(format!("Asset {}", id)));
        }

        let rows = sqlx::query("SELECT object_key FROM versions WHERE asset_id = $1")
            .bind(id.0)
            .fetch_all(&mut *tx)
            .await?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("object_key")?;
            keys.push(ObjectKey::parse(key)?);
        }

        sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("oak"), "%oak%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("oak_tree"), "%oak\\_tree%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_date_sorts_put_unversioned_last() {
        assert!(order_by(SortMode::DateAscending).contains("NULLS LAST"));
        assert!(order_by(SortMode::DateDescending).contains("NULLS LAST"));
        assert!(order_by(SortMode::NameDescending).ends_with("a.id ASC"));
    }
}
