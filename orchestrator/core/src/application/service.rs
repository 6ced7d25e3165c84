// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Service Façade
//!
//! Public operation set over agents: CRUD passthrough to the store plus the
//! composed orchestration pieces — permission guard, command router,
//! release manager, and session channel registry. Collaborators are
//! injected at construction; the façade owns no state of its own beyond
//! the registry's channel map.
//!
//! `create` embeds a generated REST credential into the agent's opaque
//! `data` blob whenever one is absent, merging with caller-supplied keys
//! rather than overwriting them. `create_release` performs no scope check
//! itself; callers authorize upstream.

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::agent::{Agent, AgentId, AgentPatch, AgentQuery, ProjectId};
use crate::domain::command::{AgentCommand, DispatcherAck, MessagePayload, RouterAck};
use crate::domain::dispatcher::RuntimeDispatcher;
use crate::domain::error::CoreError;
use crate::domain::release::ReleaseId;
use crate::domain::seraph::{SeraphEvent, SeraphEventId};
use crate::domain::store::{AgentStore, SeraphEventStore, StoreError, TransactionalStore};
use crate::domain::transport::CallerContext;

use super::channels::{SessionChannelRegistry, SubscribeOutcome};
use super::permission::PermissionGuard;
use super::release::{CreateRelease, ReleaseManager};
use super::router::CommandRouter;

#[derive(Debug, Clone)]
pub struct CreateAgent {
    pub project_id: ProjectId,
    pub name: String,
    pub enabled: Option<bool>,
    /// Operational settings blob: absent, a JSON object, or a pre-encoded
    /// JSON string.
    pub data: Option<Value>,
}

pub struct AgentService {
    agents: Arc<dyn AgentStore>,
    guard: Arc<PermissionGuard>,
    router: Arc<CommandRouter>,
    releases: ReleaseManager,
    channels: SessionChannelRegistry,
}

impl AgentService {
    pub fn new<S>(store: Arc<S>, dispatcher: Arc<dyn RuntimeDispatcher>) -> Self
    where
        S: AgentStore + SeraphEventStore + TransactionalStore + 'static,
    {
        let agents: Arc<dyn AgentStore> = store.clone();
        let events: Arc<dyn SeraphEventStore> = store.clone();
        let transactional: Arc<dyn TransactionalStore> = store.clone();

        let guard = Arc::new(PermissionGuard::new(agents.clone()));
        let router = Arc::new(CommandRouter::new(guard.clone(), dispatcher, events));
        let releases = ReleaseManager::new(transactional, agents.clone());
        let channels = SessionChannelRegistry::new(guard.clone(), router.clone());

        Self {
            agents,
            guard,
            router,
            releases,
            channels,
        }
    }

    // ------------------------------------------------------------------
    // CRUD passthrough
    // ------------------------------------------------------------------

    pub async fn get(&self, agent_id: &AgentId) -> Result<Agent, CoreError> {
        self.agents
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Agent {agent_id} not found")))
    }

    /// Filtered listing. Normalizes the raw query bag (the `"null"`
    /// sentinel and the `paginate` opt-out) before delegating to the store.
    pub async fn find(&self, query: AgentQuery) -> Result<Vec<Agent>, CoreError> {
        Ok(self.agents.find_agents(&query.normalized()).await?)
    }

    /// Create an agent, provisioning a REST credential in the `data` blob
    /// when the caller did not supply one.
    pub async fn create(&self, request: CreateAgent) -> Result<Agent, CoreError> {
        let data = prepare_agent_data(request.data)?;
        let mut agent = Agent::new(request.project_id, request.name, data);
        if let Some(enabled) = request.enabled {
            agent.enabled = enabled;
        }
        debug!(agent_id = %agent.id, project_id = %agent.project_id, "creating agent");
        Ok(self.agents.insert_agent(&agent).await?)
    }

    /// Full replace of an agent row.
    pub async fn update(&self, agent: &Agent) -> Result<Agent, CoreError> {
        self.agents.update_agent(agent).await.map_err(store_err)
    }

    pub async fn patch(&self, agent_id: &AgentId, patch: &AgentPatch) -> Result<Agent, CoreError> {
        self.agents
            .patch_agent(agent_id, patch)
            .await
            .map_err(store_err)
    }

    pub async fn remove(&self, agent_id: &AgentId) -> Result<(), CoreError> {
        self.agents.delete_agent(agent_id).await.map_err(store_err)
    }

    // ------------------------------------------------------------------
    // Routed operations
    // ------------------------------------------------------------------

    pub async fn command(
        &self,
        command: &AgentCommand,
        ctx: &CallerContext,
    ) -> Result<DispatcherAck, CoreError> {
        self.router.command(command, ctx).await
    }

    pub async fn message(
        &self,
        message: &MessagePayload,
        ctx: &CallerContext,
    ) -> Result<RouterAck, CoreError> {
        self.router.message(message, ctx).await
    }

    pub async fn sync_state(
        &self,
        agent_id: Option<&AgentId>,
        ctx: &CallerContext,
    ) -> Result<RouterAck, CoreError> {
        self.router.sync_state(agent_id, ctx).await
    }

    pub async fn ping(
        &self,
        agent_id: Option<&AgentId>,
        ctx: &CallerContext,
    ) -> Result<RouterAck, CoreError> {
        self.router.ping(agent_id, ctx).await
    }

    pub async fn process_seraph_event(
        &self,
        event: &SeraphEvent,
        ctx: &CallerContext,
    ) -> Result<RouterAck, CoreError> {
        self.router.process_seraph_event(event, ctx).await
    }

    pub async fn create_seraph_event(&self, event: &SeraphEvent) -> Result<bool, CoreError> {
        self.router.record_seraph_event(event).await
    }

    pub async fn get_seraph_events(
        &self,
        agent_id: Option<&AgentId>,
    ) -> Result<Vec<SeraphEvent>, CoreError> {
        self.router.fetch_seraph_events(agent_id).await
    }

    pub async fn delete_seraph_event(
        &self,
        seraph_event_id: Option<&SeraphEventId>,
    ) -> Result<bool, CoreError> {
        self.router.delete_seraph_event(seraph_event_id).await
    }

    // ------------------------------------------------------------------
    // Releases & channels
    // ------------------------------------------------------------------

    pub async fn create_release(&self, request: CreateRelease) -> Result<ReleaseId, CoreError> {
        self.releases.create_release(request).await
    }

    pub async fn subscribe(
        &self,
        agent_id: Option<&AgentId>,
        ctx: &CallerContext,
    ) -> Result<SubscribeOutcome, CoreError> {
        self.channels.subscribe(agent_id, ctx).await
    }

    pub fn channels(&self) -> &SessionChannelRegistry {
        &self.channels
    }

    pub fn guard(&self) -> &PermissionGuard {
        &self.guard
    }
}

/// Build the stored `data` blob for a new agent: parse string blobs, merge
/// a generated `rest_api_key` when absent, and default `rest_enabled` when
/// no blob was supplied at all.
fn prepare_agent_data(data: Option<Value>) -> Result<Value, CoreError> {
    let map = match data {
        None => {
            let mut map = Map::new();
            map.insert("rest_enabled".to_string(), Value::Bool(true));
            map
        }
        Some(Value::Object(map)) => map,
        Some(Value::String(raw)) => {
            let parsed: Value = serde_json::from_str(&raw).map_err(|e| {
                CoreError::invalid_argument(format!("agent data is not valid JSON: {e}"))
            })?;
            match parsed {
                Value::Object(map) => map,
                _ => {
                    return Err(CoreError::invalid_argument(
                        "agent data must be a JSON object",
                    ))
                }
            }
        }
        Some(_) => {
            return Err(CoreError::invalid_argument(
                "agent data must be a JSON object",
            ))
        }
    };

    let mut map = map;
    map.entry("rest_api_key".to_string())
        .or_insert_with(|| json!(generate_rest_api_key()));
    Ok(Value::Object(map))
}

/// Mutations aimed at an absent row are lookup failures, not persistence
/// failures.
fn store_err(err: StoreError) -> CoreError {
    match err {
        StoreError::NotFound(what) => CoreError::NotFound(what),
        other => CoreError::Persistence(other),
    }
}

fn generate_rest_api_key() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dispatch::NullDispatcher;
    use crate::infrastructure::stores::memory::InMemoryStore;

    #[tokio::test]
    async fn mutating_a_missing_agent_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let service = AgentService::new(store, Arc::new(NullDispatcher));
        let missing = AgentId::new();

        assert!(matches!(
            service.remove(&missing).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            service.patch(&missing, &AgentPatch::default()).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn absent_data_gets_rest_defaults() {
        let data = prepare_agent_data(None).unwrap();

        assert_eq!(data["rest_enabled"], json!(true));
        assert_eq!(data["rest_api_key"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn supplied_keys_are_merged_not_overwritten() {
        let data =
            prepare_agent_data(Some(json!({"rest_api_key": "keep-me", "voice": "on"}))).unwrap();

        assert_eq!(data["rest_api_key"], json!("keep-me"));
        assert_eq!(data["voice"], json!("on"));
    }

    #[test]
    fn string_blobs_are_parsed_before_merging() {
        let data = prepare_agent_data(Some(json!(r#"{"voice":"off"}"#))).unwrap();

        assert_eq!(data["voice"], json!("off"));
        assert!(data["rest_api_key"].is_string());
    }

    #[test]
    fn non_object_data_is_rejected() {
        assert!(matches!(
            prepare_agent_data(Some(json!(42))),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            prepare_agent_data(Some(json!("[1,2]"))),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn generated_keys_are_unique() {
        assert_ne!(generate_rest_api_key(), generate_rest_api_key());
    }
}
