// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Session Channel Registry
//!
//! Tracks which live connection currently owns each agent's real-time
//! channel and enforces single occupancy. A connection subscribing to a new
//! agent is first evicted from whichever channel it already holds, with a
//! `toggleLive:false` command routed to the old agent's runtime; the new
//! channel then gets `toggleLive:true`. Registry bookkeeping and the
//! dispatcher toggles are not transactionally linked: a toggle failure is
//! reported in the outcome, never rolled back.
//!
//! The map is the only in-memory mutable shared state in the core. All
//! bookkeeping happens without holding a lock across a store or dispatcher
//! call; a racing pair of subscribers resolves through the map's atomic
//! insert, and the loser can detect the loss via [`SessionChannelRegistry::occupant`].

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::agent::AgentId;
use crate::domain::command::AgentCommand;
use crate::domain::error::{require, CoreError};
use crate::domain::transport::{CallerContext, Connection, ConnectionId};

use super::permission::PermissionGuard;
use super::router::CommandRouter;

/// Result of a subscribe transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeOutcome {
    pub agent_id: AgentId,
    /// Agent whose channel this connection previously held, if any.
    pub evicted_agent: Option<AgentId>,
    /// Connection that previously held the target agent's channel and was
    /// displaced by this subscribe.
    pub replaced_connection: Option<ConnectionId>,
    /// Whether the `toggleLive:true` command reached the runtime. The
    /// subscription itself stands even when it did not.
    pub live_enabled: bool,
}

pub struct SessionChannelRegistry {
    channels: DashMap<AgentId, Arc<dyn Connection>>,
    guard: Arc<PermissionGuard>,
    router: Arc<CommandRouter>,
}

impl SessionChannelRegistry {
    pub fn new(guard: Arc<PermissionGuard>, router: Arc<CommandRouter>) -> Self {
        Self {
            channels: DashMap::new(),
            guard,
            router,
        }
    }

    /// Current owner of the agent's channel, if any. Lets a caller verify
    /// it still holds the channel after a contended subscribe.
    pub fn occupant(&self, agent_id: &AgentId) -> Option<ConnectionId> {
        self.channels.get(agent_id).map(|conn| conn.id())
    }

    /// Subscribe a connection to an agent's real-time channel.
    ///
    /// Requires a real-time transport and a present connection; runs the
    /// permission guard through the router's command path. The previous
    /// channel held by this connection is evicted first.
    pub async fn subscribe(
        &self,
        agent_id: Option<&AgentId>,
        ctx: &CallerContext,
    ) -> Result<SubscribeOutcome, CoreError> {
        match ctx.provider {
            Some(provider) if provider.is_realtime() => {}
            _ => {
                return Err(CoreError::InvalidOperation(
                    "subscribe is only available over a real-time transport".to_string(),
                ))
            }
        }
        let agent_id = *require(agent_id, "agentId")?;
        let connection = ctx
            .connection
            .clone()
            .ok_or_else(|| CoreError::invalid_argument("connection is required"))?;

        // Authorize against the target agent before touching any channel.
        self.guard.authorize(Some(&agent_id), ctx).await?;

        self.transition(agent_id, connection).await
    }

    async fn transition(
        &self,
        agent_id: AgentId,
        connection: Arc<dyn Connection>,
    ) -> Result<SubscribeOutcome, CoreError> {
        // Bookkeeping first, without awaiting: find and drop the channel
        // this connection already holds, then claim the new one.
        let evicted_agent = self.channels.iter().find_map(|entry| {
            (entry.value().id() == connection.id() && *entry.key() != agent_id)
                .then(|| *entry.key())
        });
        if let Some(old_agent) = evicted_agent {
            self.channels
                .remove_if(&old_agent, |_, held| held.id() == connection.id());
        }

        let replaced_connection = self
            .channels
            .insert(agent_id, connection.clone())
            .map(|previous| previous.id())
            .filter(|id| *id != connection.id());

        debug!(agent_id = %agent_id, connection = %connection.id(), "subscribed to agent channel");

        // Dispatcher toggles after the bookkeeping. Failures are reported,
        // not fatal: the registry and the runtime converge eventually.
        if let Some(old_agent) = evicted_agent {
            if let Err(err) = self
                .router
                .command(
                    &AgentCommand::toggle_live(old_agent, false),
                    &CallerContext::internal(),
                )
                .await
            {
                warn!(
                    agent_id = %old_agent,
                    error = %err,
                    "failed to disable live mode on evicted agent channel"
                );
            }
        }

        let live_enabled = match self
            .router
            .command(
                &AgentCommand::toggle_live(agent_id, true),
                &CallerContext::internal(),
            )
            .await
        {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    agent_id = %agent_id,
                    error = %err,
                    "subscription recorded but enabling live mode failed"
                );
                false
            }
        };

        Ok(SubscribeOutcome {
            agent_id,
            evicted_agent,
            replaced_connection,
            live_enabled,
        })
    }

    /// Remove a connection from an agent's channel. Invoked by the
    /// transport when a connection closes.
    pub fn unsubscribe(&self, agent_id: &AgentId, connection_id: ConnectionId) -> bool {
        self.channels
            .remove_if(agent_id, |_, held| held.id() == connection_id)
            .is_some()
    }
}
