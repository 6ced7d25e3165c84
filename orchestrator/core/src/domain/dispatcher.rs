// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Runtime Dispatcher Port
//!
//! Contract for the external collaborator that executes commands and events
//! against a live agent process. The core never assumes the dispatcher and
//! the store are consistent at every instant; dispatch failures after a
//! committed write are reported, not rolled back.

use async_trait::async_trait;

use crate::domain::agent::AgentId;
use crate::domain::command::{AgentCommand, DispatcherAck};
use crate::domain::seraph::SeraphEvent;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatcher unreachable: {0}")]
    Unreachable(String),

    #[error("dispatcher rejected the request: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait RuntimeDispatcher: Send + Sync {
    /// Execute a named command against the agent's live process.
    async fn command(&self, command: &AgentCommand) -> Result<DispatcherAck, DispatchError>;

    /// Deliver an event payload to the agent.
    async fn message(
        &self,
        agent_id: AgentId,
        payload: &serde_json::Value,
    ) -> Result<DispatcherAck, DispatchError>;

    /// Ask the runtime to re-sync the agent's state.
    async fn sync_state(&self, agent_id: AgentId) -> Result<(), DispatchError>;

    /// Liveness poke. Distinguished from a patch so it never produces a
    /// change-notification event.
    async fn ping(&self, agent_id: AgentId) -> Result<(), DispatchError>;

    /// Hand a seraph event to the live runtime for processing.
    async fn process_seraph_event(&self, event: &SeraphEvent) -> Result<(), DispatchError>;
}
