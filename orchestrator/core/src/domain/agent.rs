// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Aggregate
//!
//! The orchestrated entity. An agent belongs to exactly one project, carries
//! an opaque `data` blob of operational settings (REST credentials among
//! them), and points at its currently active spell release through
//! `current_release_id`. The pointer, once set, must reference a release
//! created for this same agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub project_id: ProjectId,
    pub name: String,
    pub enabled: bool,
    /// Active release pointer. `None` until the first release is created.
    pub current_release_id: Option<crate::domain::release::ReleaseId>,
    /// Opaque operational settings. Known keys: `rest_enabled`,
    /// `rest_api_key`. Treated as a bag elsewhere in the core.
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    pub fn new(project_id: ProjectId, name: impl Into<String>, data: Value) -> Self {
        let now = Utc::now();
        Self {
            id: AgentId::new(),
            project_id,
            name: name.into(),
            enabled: true,
            current_release_id: None,
            data,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: &AgentPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(release_id) = patch.current_release_id {
            self.current_release_id = Some(release_id);
        }
        if let Some(data) = &patch.data {
            self.data = data.clone();
        }
        self.updated_at = patch.updated_at.unwrap_or_else(Utc::now);
    }
}

/// Partial update for an agent. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_release_id: Option<crate::domain::release::ReleaseId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Query parameters for `find`, carried as a raw key/value bag the way the
/// transport hands them over. `normalized()` applies the query-time
/// conventions before the bag reaches the store: the `"null"` sentinel
/// string becomes a true null, and a `paginate=false` entry is lifted out of
/// the bag into the pagination opt-out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentQuery {
    #[serde(default)]
    pub filters: serde_json::Map<String, Value>,
    /// `false` bypasses the store's default pagination.
    #[serde(default = "default_paginate")]
    pub paginate: bool,
}

fn default_paginate() -> bool {
    true
}

impl AgentQuery {
    pub fn normalized(mut self) -> Self {
        for value in self.filters.values_mut() {
            if value.as_str() == Some("null") {
                *value = Value::Null;
            }
        }
        if let Some(paginate) = self.filters.remove("paginate") {
            // The transport sends the flag as the string "false".
            if paginate == Value::String("false".into()) || paginate == Value::Bool(false) {
                self.paginate = false;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalized_replaces_null_sentinel_strings() {
        let query = AgentQuery {
            filters: json!({"current_release_id": "null", "name": "druid"})
                .as_object()
                .cloned()
                .unwrap(),
            paginate: true,
        }
        .normalized();

        assert_eq!(query.filters.get("current_release_id"), Some(&Value::Null));
        assert_eq!(query.filters.get("name"), Some(&json!("druid")));
    }

    #[test]
    fn normalized_lifts_paginate_flag_out_of_the_bag() {
        let query = AgentQuery {
            filters: json!({"paginate": "false", "enabled": true})
                .as_object()
                .cloned()
                .unwrap(),
            paginate: true,
        }
        .normalized();

        assert!(!query.paginate);
        assert!(!query.filters.contains_key("paginate"));
        assert!(query.filters.contains_key("enabled"));
    }

    #[test]
    fn apply_patch_updates_only_present_fields() {
        let mut agent = Agent::new(ProjectId::new(), "scribe", json!({}));
        let created = agent.created_at;
        let patch = AgentPatch {
            enabled: Some(false),
            ..Default::default()
        };

        agent.apply(&patch);

        assert!(!agent.enabled);
        assert_eq!(agent.name, "scribe");
        assert_eq!(agent.created_at, created);
        assert!(agent.updated_at >= created);
    }
}
