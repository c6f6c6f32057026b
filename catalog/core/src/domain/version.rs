// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Version Aggregate Member & Version Sequencer
//!
//! A `Version` is an immutable, semver-tagged snapshot of an asset's content.
//! Semantic versions in the catalog have two numeric components
//! (`MAJOR.MINOR`, no patch) and compare component-wise, so `0.9 < 0.10`.
//!
//! [`next_version`] is the sequencer: a pure function from an asset's existing
//! versions and a [`BumpKind`] to the version the next upload receives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::asset::AssetId;

// ============================================================================
// Value Objects
// ============================================================================

/// Two-component semantic version.
///
/// Field order matters: the derived `Ord` compares `major` first, then
/// `minor`, which is exactly the numeric ordering versions are sequenced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemVer {
    pub major: u32,
    pub minor: u32,
}

impl SemVer {
    /// The version every asset's first upload receives.
    pub const INITIAL: SemVer = SemVer { major: 0, minor: 1 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Apply a bump to this version, failing if the bumped component is
    /// already at its maximum.
    pub fn bump(self, kind: BumpKind) -> Result<Self, VersionExhausted> {
        let bumped = match kind {
            BumpKind::Minor => self
                .minor
                .checked_add(1)
                .map(|minor| Self::new(self.major, minor)),
            BumpKind::Major => self
                .major
                .checked_add(1)
                .map(|major| Self::new(major, 0)),
        };
        bumped.ok_or(VersionExhausted {
            latest: self,
            kind,
        })
    }
}

/// The latest version has no successor for the requested bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Version {latest} cannot take a {kind:?} bump")]
pub struct VersionExhausted {
    pub latest: SemVer,
    pub kind: BumpKind,
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemVerParseError {
    #[error("Version must have the form MAJOR.MINOR: '{0}'")]
    Malformed(String),

    #[error("Invalid version component '{component}' in '{input}'")]
    InvalidComponent { input: String, component: String },
}

impl FromStr for SemVer {
    type Err = SemVerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| SemVerParseError::Malformed(s.to_string()))?;

        Ok(Self {
            major: parse_component(s, major)?,
            minor: parse_component(s, minor)?,
        })
    }
}

/// Parse one numeric component. Rejects signs, empty strings, a third
/// component and leading zeros so that every accepted string formats back to
/// itself.
fn parse_component(input: &str, component: &str) -> Result<u32, SemVerParseError> {
    let invalid = || SemVerParseError::InvalidComponent {
        input: input.to_string(),
        component: component.to_string(),
    };

    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if component.len() > 1 && component.starts_with('0') {
        return Err(invalid());
    }
    component.parse().map_err(|_| invalid())
}

impl Serialize for SemVer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemVer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Which component a new upload increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
    Major,
    #[default]
    Minor,
}

/// Opaque object-store key referencing a version's blob.
///
/// Generated keys are UUID v4 text and carry no relation to the semver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Mint a fresh, globally unique key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validate an externally supplied key.
    ///
    /// Keys double as local file names, so only `[A-Za-z0-9._-]` is accepted
    /// and a leading `.` is refused.
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidObjectKey> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && !raw.starts_with('.')
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
        if valid {
            Ok(Self(raw))
        } else {
            Err(InvalidObjectKey(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid object key: '{0}'")]
pub struct InvalidObjectKey(pub String);

// ============================================================================
// Entities
// ============================================================================

/// Immutable version record. Identity is `(asset_id, semver)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub asset_id: AssetId,
    pub semver: SemVer,
    pub author_id: String,
    /// Assigned by the relational store at insert.
    pub created_at: DateTime<Utc>,
    pub message: String,
    pub object_key: ObjectKey,
}

/// Everything needed to insert a version row; the store assigns `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVersion {
    pub asset_id: AssetId,
    pub semver: SemVer,
    pub author_id: String,
    pub message: String,
    pub object_key: ObjectKey,
}

impl NewVersion {
    pub fn into_version(self, created_at: DateTime<Utc>) -> Version {
        Version {
            asset_id: self.asset_id,
            semver: self.semver,
            author_id: self.author_id,
            created_at,
            message: self.message,
            object_key: self.object_key,
        }
    }
}

/// Direction for per-asset version history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VersionOrder {
    #[serde(alias = "asc")]
    Ascending,
    #[default]
    #[serde(alias = "desc")]
    Descending,
}

impl Version {
    /// History ordering: creation time, then numeric semver, both in the
    /// requested direction.
    pub fn cmp_history(&self, other: &Self, order: VersionOrder) -> std::cmp::Ordering {
        let ascending = self
            .created_at
            .cmp(&other.created_at)
            .then_with(|| self.semver.cmp(&other.semver));
        match order {
            VersionOrder::Ascending => ascending,
            VersionOrder::Descending => ascending.reverse(),
        }
    }
}

// ============================================================================
// Version Sequencer
// ============================================================================

/// Compute the version the next upload of an asset receives.
///
/// An asset without versions always starts at `0.1`, whatever the bump kind.
/// Otherwise the numerically greatest existing version is bumped.
pub fn next_version<'a, I>(existing: I, kind: BumpKind) -> Result<SemVer, VersionExhausted>
where
    I: IntoIterator<Item = &'a SemVer>,
{
    match existing.into_iter().max() {
        None => Ok(SemVer::INITIAL),
        Some(latest) => latest.bump(kind),
    }
}
