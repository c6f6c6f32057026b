// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application error taxonomy
//!
//! Every service operation returns [`CatalogError`]. `NotFound` and
//! `InvalidInput` are the caller's fault; the rest are server-side and must
//! never be reported as "not found".

use thiserror::Error;

use crate::domain::repository::RepositoryError;
use crate::domain::search::UnknownSortMode;
use crate::domain::storage::ObjectStoreError;
use crate::domain::version::{InvalidObjectKey, SemVerParseError, VersionExhausted};

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Object store unavailable: {0}")]
    StoreUnavailable(#[source] ObjectStoreError),

    #[error("Database error: {0}")]
    Database(String),
}

impl CatalogError {
    /// Whether the failure is attributable to the caller's request
    pub fn is_client_error(&self) -> bool {
        matches!(self, CatalogError::NotFound(_) | CatalogError::InvalidInput(_))
    }
}

impl From<RepositoryError> for CatalogError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => CatalogError::NotFound(msg),
            RepositoryError::Conflict(msg) => CatalogError::Conflict(msg),
            RepositoryError::Database(msg) | RepositoryError::Serialization(msg) => {
                CatalogError::Database(msg)
            }
        }
    }
}

impl From<ObjectStoreError> for CatalogError {
    fn from(err: ObjectStoreError) -> Self {
        CatalogError::StoreUnavailable(err)
    }
}

impl From<uuid::Error> for CatalogError {
    fn from(err: uuid::Error) -> Self {
        CatalogError::InvalidInput(format!("Malformed asset id: {}", err))
    }
}

impl From<SemVerParseError> for CatalogError {
    fn from(err: SemVerParseError) -> Self {
        CatalogError::InvalidInput(err.to_string())
    }
}

impl From<UnknownSortMode> for CatalogError {
    fn from(err: UnknownSortMode) -> Self {
        CatalogError::InvalidInput(err.to_string())
    }
}

impl From<VersionExhausted> for CatalogError {
    fn from(err: VersionExhausted) -> Self {
        CatalogError::InvalidInput(err.to_string())
    }
}

impl From<InvalidObjectKey> for CatalogError {
    fn from(err: InvalidObjectKey) -> Self {
        CatalogError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::AssetId;
    use crate::domain::version::SemVer;

    fn parse_ids(asset: &str, semver: &str) -> Result<(AssetId, SemVer)> {
        Ok((AssetId::from_string(asset)?, semver.parse()?))
    }

    #[test]
    fn test_malformed_identifiers_are_invalid_input() {
        let err = parse_ids("not-a-uuid", "0.1").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(_)));
        assert!(err.is_client_error());

        let err = parse_ids(&AssetId::new().to_string(), "v1").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(_)));
    }

    #[test]
    fn test_store_failures_are_server_errors() {
        let err = CatalogError::from(ObjectStoreError::NotFound("k".to_string()));
        assert!(matches!(err, CatalogError::StoreUnavailable(_)));
        assert!(!err.is_client_error());

        let err = CatalogError::from(RepositoryError::Database("timeout".to_string()));
        assert!(!err.is_client_error());
    }
}
