// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Command & Acknowledgement Payloads
//!
//! Value objects exchanged with the runtime dispatcher. Commands carry an
//! optional agent id on purpose: the router rejects an absent id with
//! `InvalidArgument` rather than the transport inventing one.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::agent::AgentId;

/// Command name that flips an agent's spellbook in or out of live mode.
pub const TOGGLE_LIVE_COMMAND: &str = "agent:spellbook:toggleLive";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCommand {
    pub agent_id: Option<AgentId>,
    pub command: String,
    #[serde(default)]
    pub data: Value,
}

impl AgentCommand {
    pub fn new(agent_id: AgentId, command: impl Into<String>, data: Value) -> Self {
        Self {
            agent_id: Some(agent_id),
            command: command.into(),
            data,
        }
    }

    pub fn toggle_live(agent_id: AgentId, live: bool) -> Self {
        Self::new(agent_id, TOGGLE_LIVE_COMMAND, json!({ "live": live }))
    }
}

/// Event payload addressed to a live agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub agent_id: Option<AgentId>,
    #[serde(default)]
    pub payload: Value,
}

/// Dispatcher acknowledgement, returned verbatim to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatcherAck {
    pub response: Value,
}

impl DispatcherAck {
    pub fn empty() -> Self {
        Self {
            response: Value::Null,
        }
    }
}

/// Simple success envelope for side-effect-only routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterAck {
    pub success: bool,
}

impl RouterAck {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
