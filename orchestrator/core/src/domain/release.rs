// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Release Record
//!
//! Immutable snapshot of an agent's spell set. A release is never edited;
//! it is superseded by creating a new one and repointing the agent's
//! `current_release_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::agent::{AgentId, ProjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseId(pub Uuid);

impl ReleaseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReleaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub agent_id: AgentId,
    pub project_id: ProjectId,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Release {
    pub fn new(agent_id: AgentId, project_id: ProjectId, description: impl Into<String>) -> Self {
        Self {
            id: ReleaseId::new(),
            agent_id,
            project_id,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}
