// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Command/Event Router
//!
//! Forwards authorized commands and lifecycle events to the runtime
//! dispatcher and persists seraph event history. Every routed operation runs
//! the permission guard first; acknowledgements come back verbatim from the
//! dispatcher. Persisted seraph writes are append-only; the follow-up
//! dispatcher notification is best-effort and never undoes the write.

use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::domain::agent::AgentId;
use crate::domain::command::{AgentCommand, DispatcherAck, MessagePayload, RouterAck};
use crate::domain::dispatcher::RuntimeDispatcher;
use crate::domain::error::{require, CoreError};
use crate::domain::seraph::{SeraphEvent, SeraphEventId, SERAPH_EVENT_FETCH_LIMIT};
use crate::domain::store::SeraphEventStore;
use crate::domain::transport::CallerContext;

use super::permission::PermissionGuard;

pub struct CommandRouter {
    guard: Arc<PermissionGuard>,
    dispatcher: Arc<dyn RuntimeDispatcher>,
    events: Arc<dyn SeraphEventStore>,
}

impl CommandRouter {
    pub fn new(
        guard: Arc<PermissionGuard>,
        dispatcher: Arc<dyn RuntimeDispatcher>,
        events: Arc<dyn SeraphEventStore>,
    ) -> Self {
        Self {
            guard,
            dispatcher,
            events,
        }
    }

    /// Execute a named command against the agent's live process and return
    /// the dispatcher's acknowledgement unchanged.
    pub async fn command(
        &self,
        command: &AgentCommand,
        ctx: &CallerContext,
    ) -> Result<DispatcherAck, CoreError> {
        require(command.agent_id.as_ref(), "agentId")?;
        self.guard.authorize(command.agent_id.as_ref(), ctx).await?;
        Ok(self.dispatcher.command(command).await?)
    }

    /// Deliver an event payload to the agent.
    pub async fn message(
        &self,
        message: &MessagePayload,
        ctx: &CallerContext,
    ) -> Result<RouterAck, CoreError> {
        let agent = self.guard.authorize(message.agent_id.as_ref(), ctx).await?;
        self.dispatcher.message(agent.id, &message.payload).await?;
        Ok(RouterAck::ok())
    }

    pub async fn sync_state(
        &self,
        agent_id: Option<&AgentId>,
        ctx: &CallerContext,
    ) -> Result<RouterAck, CoreError> {
        let agent = self.guard.authorize(agent_id, ctx).await?;
        self.dispatcher.sync_state(agent.id).await?;
        Ok(RouterAck::ok())
    }

    /// Liveness poke. Routed separately from patches so it never produces a
    /// change-notification event for the agent.
    pub async fn ping(
        &self,
        agent_id: Option<&AgentId>,
        ctx: &CallerContext,
    ) -> Result<RouterAck, CoreError> {
        let agent = self.guard.authorize(agent_id, ctx).await?;
        self.dispatcher.ping(agent.id).await?;
        Ok(RouterAck::ok())
    }

    /// Forward a seraph event for live processing, independent of history.
    pub async fn process_seraph_event(
        &self,
        event: &SeraphEvent,
        ctx: &CallerContext,
    ) -> Result<RouterAck, CoreError> {
        self.guard.authorize(Some(&event.agent_id), ctx).await?;
        self.dispatcher.process_seraph_event(event).await?;
        Ok(RouterAck::ok())
    }

    /// Persist a seraph event, then best-effort hand it to the dispatcher.
    /// A dispatch failure after the insert is reported but does not undo
    /// the persisted row.
    pub async fn record_seraph_event(&self, event: &SeraphEvent) -> Result<bool, CoreError> {
        if event.data.is_null() {
            return Err(CoreError::invalid_argument("seraph event data missing"));
        }

        let stored = self.events.insert_seraph_event(event).await.map_err(|e| {
            error!(agent_id = %event.agent_id, error = %e, "error creating seraph event");
            e
        })?;

        if let Err(err) = self.dispatcher.process_seraph_event(&stored).await {
            warn!(
                agent_id = %stored.agent_id,
                seraph_event_id = %stored.id,
                error = %err,
                "seraph event persisted but dispatcher notification failed"
            );
        }

        Ok(true)
    }

    /// History for one agent: the most recent rows, ascending by creation
    /// time, capped at [`SERAPH_EVENT_FETCH_LIMIT`].
    pub async fn fetch_seraph_events(
        &self,
        agent_id: Option<&AgentId>,
    ) -> Result<Vec<SeraphEvent>, CoreError> {
        let agent_id = require(agent_id, "agentId")?;
        debug!(agent_id = %agent_id, "fetching seraph events");
        Ok(self
            .events
            .list_seraph_events(agent_id, SERAPH_EVENT_FETCH_LIMIT)
            .await?)
    }

    pub async fn delete_seraph_event(
        &self,
        seraph_event_id: Option<&SeraphEventId>,
    ) -> Result<bool, CoreError> {
        let id = require(seraph_event_id, "seraphEventId")?;
        let removed = self.events.delete_seraph_event(id).await?;
        if removed == 0 {
            return Err(CoreError::not_found(format!("Seraph event {id} not found")));
        }
        Ok(true)
    }
}
