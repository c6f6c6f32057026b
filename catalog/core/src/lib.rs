// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Griddle Catalog Core
//!
//! Versioned asset catalog: named creative assets, each with an ordered
//! history of immutable content versions held in an object store.
//!
//! - [`domain`] - assets, versions and the version sequencer, search rules,
//!   repository and object-store contracts, configuration
//! - [`application`] - the artifact lifecycle, asset query and asset catalog
//!   services
//! - [`infrastructure`] - PostgreSQL and in-memory repositories, local, S3
//!   and in-memory object stores, the event bus
//! - [`catalog`] - explicit wiring of all of the above from configuration

pub mod application;
pub mod catalog;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;

pub use catalog::Catalog;
