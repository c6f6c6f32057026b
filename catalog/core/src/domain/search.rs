// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Asset Search
//!
//! Free-text search over the catalog. A query is tokenized once and then
//! evaluated either in memory ([`SearchQuery::matches`]) or translated into
//! SQL predicates by the PostgreSQL repository; both paths implement the same
//! rules:
//!
//! - a query containing a comma is split on commas (tokens trimmed), any
//!   other query on whitespace; empty tokens are dropped;
//! - an asset matches when, case-insensitively, the raw query is a substring
//!   of the name or of the author id, or any token is a substring of the name
//!   or of the keywords.
//!
//! Results carry no relevance ranking; ordering comes from [`SortMode`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::asset::Asset;

/// Fixed page size for asset listings and version histories.
pub const PAGE_SIZE: usize = 24;

/// Split a query into search tokens.
pub fn tokenize(query: &str) -> Vec<String> {
    if query.contains(',') {
        query
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        query.split_whitespace().map(str::to_string).collect()
    }
}

/// A parsed, non-empty free-text query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    tokens: Vec<String>,
}

impl SearchQuery {
    /// Parse caller input. Absent, empty and whitespace-only input all mean
    /// "no filter" and yield `None`.
    pub fn parse(input: Option<&str>) -> Option<Self> {
        let raw = input?;
        if raw.trim().is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            tokens: tokenize(raw),
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        let raw = self.raw.to_lowercase();
        let name = asset.name.to_lowercase();
        let keywords = asset.keywords.to_lowercase();

        if name.contains(&raw) || asset.author_id.to_lowercase().contains(&raw) {
            return true;
        }

        self.tokens.iter().any(|token| {
            let token = token.to_lowercase();
            name.contains(&token) || keywords.contains(&token)
        })
    }
}

/// Sort order for asset listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[serde(alias = "name_asc")]
    NameAscending,
    #[serde(alias = "name_dsc")]
    NameDescending,
    #[serde(alias = "date_asc")]
    DateAscending,
    #[default]
    #[serde(alias = "date_dsc")]
    DateDescending,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown sort mode: '{0}'")]
pub struct UnknownSortMode(pub String);

impl FromStr for SortMode {
    type Err = UnknownSortMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name_ascending" | "name_asc" => Ok(Self::NameAscending),
            "name_descending" | "name_dsc" | "name_desc" => Ok(Self::NameDescending),
            "date_ascending" | "date_asc" => Ok(Self::DateAscending),
            "date_descending" | "date_dsc" | "date_desc" => Ok(Self::DateDescending),
            other => Err(UnknownSortMode(other.to_string())),
        }
    }
}

impl SortMode {
    /// Compare two assets for listing.
    ///
    /// `latest_*` is each asset's most recent version timestamp. Assets
    /// without versions go last under both date orders. Ties fall back to the
    /// asset id so that offset pagination is stable.
    pub fn compare(
        self,
        a: &Asset,
        latest_a: Option<DateTime<Utc>>,
        b: &Asset,
        latest_b: Option<DateTime<Utc>>,
    ) -> Ordering {
        let primary = match self {
            Self::NameAscending => a.name.cmp(&b.name),
            Self::NameDescending => b.name.cmp(&a.name),
            Self::DateAscending | Self::DateDescending => match (latest_a, latest_b) {
                (Some(x), Some(y)) if self == Self::DateAscending => x.cmp(&y),
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// A complete listing request: filter, order and page window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSearch {
    pub query: Option<SearchQuery>,
    pub sort: SortMode,
    pub offset: usize,
    pub limit: usize,
}

impl AssetSearch {
    /// One page of results starting at `offset`.
    pub fn page(query: Option<&str>, sort: SortMode, offset: usize) -> Self {
        Self {
            query: SearchQuery::parse(query),
            sort,
            offset,
            limit: PAGE_SIZE,
        }
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        self.query.as_ref().map_or(true, |q| q.matches(asset))
    }
}
