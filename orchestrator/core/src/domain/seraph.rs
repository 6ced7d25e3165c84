// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Seraph Event Log Entry
//!
//! Append-only record of agent activity. Rows are never mutated after
//! insert; retrieval is bounded to the most recent
//! [`SERAPH_EVENT_FETCH_LIMIT`] rows, returned oldest-first within that
//! window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::domain::agent::AgentId;

/// Upper bound on a single seraph event fetch.
pub const SERAPH_EVENT_FETCH_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeraphEventId(pub Uuid);

impl SeraphEventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SeraphEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeraphEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeraphEvent {
    pub id: SeraphEventId,
    pub agent_id: AgentId,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl SeraphEvent {
    pub fn new(agent_id: AgentId, data: Value) -> Self {
        Self {
            id: SeraphEventId::new(),
            agent_id,
            data,
            created_at: Utc::now(),
        }
    }
}
