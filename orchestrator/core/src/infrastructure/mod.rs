// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0

pub mod config;
pub mod db;
pub mod dispatch;
pub mod stores;

pub use config::{CoreConfig, StorageBackend};
pub use db::Database;
pub use stores::service_from_config;
