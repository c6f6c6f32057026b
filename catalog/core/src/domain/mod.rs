// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod asset;
pub mod config;
pub mod events;
pub mod repository;
pub mod search;
pub mod storage;
pub mod version;
