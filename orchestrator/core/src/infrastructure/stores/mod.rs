// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! Store implementations: in-memory for development and testing,
//! PostgreSQL for production persistence. The backend is selected at
//! startup from [`crate::infrastructure::config::CoreConfig`].

use std::sync::Arc;

use anyhow::Result;

use crate::application::AgentService;
use crate::domain::dispatcher::RuntimeDispatcher;
use crate::infrastructure::config::{CoreConfig, StorageBackend};
use crate::infrastructure::db::Database;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Build the agent service over the storage backend the configuration
/// names. The PostgreSQL arm connects the pool; the in-memory arm starts
/// empty.
pub async fn service_from_config(
    config: &CoreConfig,
    dispatcher: Arc<dyn RuntimeDispatcher>,
) -> Result<AgentService> {
    match &config.storage {
        StorageBackend::InMemory => Ok(AgentService::new(
            Arc::new(InMemoryStore::new()),
            dispatcher,
        )),
        StorageBackend::Postgres {
            connection_string,
            max_connections,
        } => {
            let database = Database::new(connection_string, *max_connections).await?;
            let store = PostgresStore::new(database.get_pool().clone(), config.find_limit);
            Ok(AgentService::new(Arc::new(store), dispatcher))
        }
    }
}
