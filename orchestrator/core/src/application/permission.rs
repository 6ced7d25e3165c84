// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Permission Guard
//!
//! Verifies that a caller may act on an agent before any mutating or
//! routing operation runs. The check is a real boundary for
//! externally-originated calls (the agent's project must match the caller's
//! scope) and a pass-through for internal service calls, which carry no
//! provider. Read-only: the guard issues no store writes.

use std::sync::Arc;
use tracing::error;

use crate::domain::agent::{Agent, AgentId};
use crate::domain::error::{require, CoreError};
use crate::domain::store::AgentStore;
use crate::domain::transport::CallerContext;

pub struct PermissionGuard {
    agents: Arc<dyn AgentStore>,
}

impl PermissionGuard {
    pub fn new(agents: Arc<dyn AgentStore>) -> Self {
        Self { agents }
    }

    /// Load the agent and enforce project scope for external callers.
    ///
    /// Fails `InvalidArgument` when the id is absent, `NotFound` when the
    /// agent does not exist, and `NotAuthenticated` when an external
    /// caller's project does not match the agent's.
    pub async fn authorize(
        &self,
        agent_id: Option<&AgentId>,
        ctx: &CallerContext,
    ) -> Result<Agent, CoreError> {
        let agent_id = require(agent_id, "agentId")?;

        let agent = self
            .agents
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Agent {agent_id} not found")))?;

        if ctx.provider.is_some() {
            // Without transport-supplied scope the expected project is the
            // agent's own, which makes the check a tautology for callers
            // that did not authenticate one.
            let expected = ctx.project_id.unwrap_or(agent.project_id);
            if agent.project_id != expected {
                error!(
                    agent_id = %agent.id,
                    agent_project = %agent.project_id,
                    caller_project = %expected,
                    "agent does not belong to the caller's project"
                );
                return Err(CoreError::NotAuthenticated(
                    "You don't have access to this agent".to_string(),
                ));
            }
        }

        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::ProjectId;
    use crate::infrastructure::stores::memory::InMemoryStore;
    use serde_json::json;

    async fn seeded_store() -> (Arc<InMemoryStore>, Agent) {
        let store = Arc::new(InMemoryStore::new());
        let agent = Agent::new(ProjectId::new(), "warden", json!({}));
        let stored = store.insert_agent(&agent).await.unwrap();
        (store, stored)
    }

    #[tokio::test]
    async fn missing_agent_id_is_an_invalid_argument() {
        let (store, _) = seeded_store().await;
        let guard = PermissionGuard::new(store.clone());

        let err = guard
            .authorize(None, &CallerContext::internal())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert_eq!(store.write_count(), 1); // the seed insert only
    }

    #[tokio::test]
    async fn unknown_agent_is_not_found() {
        let (store, _) = seeded_store().await;
        let guard = PermissionGuard::new(store.clone());
        let missing = AgentId::new();

        let err = guard
            .authorize(Some(&missing), &CallerContext::internal())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::NotFound(_)));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn external_caller_with_wrong_project_is_rejected() {
        let (store, agent) = seeded_store().await;
        let guard = PermissionGuard::new(store);

        let err = guard
            .authorize(Some(&agent.id), &CallerContext::rest(ProjectId::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::NotAuthenticated(_)));
    }

    #[tokio::test]
    async fn external_caller_with_matching_project_passes() {
        let (store, agent) = seeded_store().await;
        let guard = PermissionGuard::new(store);

        let authorized = guard
            .authorize(Some(&agent.id), &CallerContext::rest(agent.project_id))
            .await
            .unwrap();

        assert_eq!(authorized.id, agent.id);
    }

    #[tokio::test]
    async fn internal_caller_bypasses_project_scope() {
        let (store, agent) = seeded_store().await;
        let guard = PermissionGuard::new(store);

        let authorized = guard
            .authorize(Some(&agent.id), &CallerContext::internal())
            .await
            .unwrap();

        assert_eq!(authorized.id, agent.id);
    }
}
