// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Core Configuration
//!
//! Storage backend selection and listing defaults, loaded from a YAML file
//! at orchestrator startup. In-memory storage is the development default;
//! production deployments point at PostgreSQL.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_max_connections() -> u32 {
    5
}

fn default_find_limit() -> usize {
    25
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageBackend {
    InMemory,
    Postgres {
        connection_string: String,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::InMemory
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub storage: StorageBackend,
    /// Default page size applied to agent listings unless the query opts
    /// out of pagination.
    #[serde(default = "default_find_limit")]
    pub find_limit: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            find_limit: default_find_limit(),
        }
    }
}

impl CoreConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading core config from {}", path.display()))?;
        let config: CoreConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing core config from {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_in_memory_storage() {
        let config: CoreConfig = serde_yaml::from_str("{}").unwrap();
        assert!(matches!(config.storage, StorageBackend::InMemory));
        assert_eq!(config.find_limit, 25);
    }

    #[test]
    fn parses_postgres_backend() {
        let yaml = r#"
storage:
  backend: postgres
  connection_string: postgres://localhost/arcanum
find_limit: 50
"#;
        let config: CoreConfig = serde_yaml::from_str(yaml).unwrap();
        match config.storage {
            StorageBackend::Postgres {
                connection_string,
                max_connections,
            } => {
                assert_eq!(connection_string, "postgres://localhost/arcanum");
                assert_eq!(max_connections, 5);
            }
            other => panic!("expected postgres backend, got {other:?}"),
        }
        assert_eq!(config.find_limit, 50);
    }
}
