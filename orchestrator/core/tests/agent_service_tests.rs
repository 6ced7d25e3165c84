// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the agent service façade
//!
//! These tests drive the public operation set end to end against the
//! in-memory store and a recording dispatcher:
//! 1. Create agents and verify REST credential provisioning
//! 2. Fork a release and verify the duplicated spell set
//! 3. Route commands and messages through authorization
//! 4. Subscribe/evict live channels

use arcanum_core::application::{AgentService, CreateAgent, CreateRelease};
use arcanum_core::domain::{
    Agent, AgentCommand, AgentId, AgentQuery, CallerContext, Connection, ConnectionId, CoreError,
    MessagePayload, PageRequest, ProjectId, SeraphEvent, Spell, SpellQuery, SpellStore,
};
use arcanum_core::infrastructure::dispatch::{DispatchCall, RecordingDispatcher};
use arcanum_core::infrastructure::stores::InMemoryStore;
use arcanum_core::infrastructure::{service_from_config, CoreConfig};
use serde_json::json;
use std::sync::Arc;

struct StubConnection {
    id: ConnectionId,
}

impl Connection for StubConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }
}

fn stub_connection() -> Arc<dyn Connection> {
    Arc::new(StubConnection {
        id: ConnectionId::new(),
    })
}

struct Harness {
    store: Arc<InMemoryStore>,
    dispatcher: Arc<RecordingDispatcher>,
    service: AgentService,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let service = AgentService::new(store.clone(), dispatcher.clone());
    Harness {
        store,
        dispatcher,
        service,
    }
}

impl Harness {
    async fn create_agent(&self, name: &str) -> Agent {
        self.service
            .create(CreateAgent {
                project_id: ProjectId::new(),
                name: name.to_string(),
                enabled: None,
                data: None,
            })
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn default_config_builds_a_working_in_memory_service() {
    let config = CoreConfig::default();
    let service = service_from_config(&config, Arc::new(RecordingDispatcher::new()))
        .await
        .unwrap();

    let agent = service
        .create(CreateAgent {
            project_id: ProjectId::new(),
            name: "conjurer".to_string(),
            enabled: None,
            data: None,
        })
        .await
        .unwrap();

    assert_eq!(service.get(&agent.id).await.unwrap().id, agent.id);
}

#[tokio::test]
async fn create_provisions_a_rest_credential() {
    let h = harness();

    let agent = h.create_agent("sage").await;

    assert_eq!(agent.data["rest_enabled"], json!(true));
    assert!(agent.data["rest_api_key"].is_string());
    // The credential is persisted, not just returned.
    let stored = h.service.get(&agent.id).await.unwrap();
    assert_eq!(stored.data["rest_api_key"], agent.data["rest_api_key"]);
}

#[tokio::test]
async fn create_merges_caller_data_without_overwriting() {
    let h = harness();

    let agent = h
        .service
        .create(CreateAgent {
            project_id: ProjectId::new(),
            name: "sage".to_string(),
            enabled: Some(false),
            data: Some(json!({"rest_api_key": "pinned", "model": "arcana-1"})),
        })
        .await
        .unwrap();

    assert!(!agent.enabled);
    assert_eq!(agent.data["rest_api_key"], json!("pinned"));
    assert_eq!(agent.data["model"], json!("arcana-1"));
}

#[tokio::test]
async fn release_scenario_duplicates_drafts_and_repoints_the_agent() {
    let h = harness();
    let a1 = h.create_agent("a1").await;
    let s1 = Spell::draft(a1.project_id, a1.id, "s1", json!({"nodes": ["a"]}));
    let s2 = Spell::draft(a1.project_id, a1.id, "s2", json!({"nodes": ["b"]}));
    h.store.insert_spell(&s1).await.unwrap();
    h.store.insert_spell(&s2).await.unwrap();

    let r1 = h
        .service
        .create_release(CreateRelease {
            agent_id: a1.id,
            description: "v1".to_string(),
            source_agent_id: a1.id,
        })
        .await
        .unwrap();

    let page = h
        .store
        .list_spells(
            &SpellQuery {
                project_id: a1.project_id,
                agent_id: a1.id,
            },
            PageRequest::first(100),
        )
        .await
        .unwrap();
    assert!(page.next.is_none());
    assert_eq!(page.spells.len(), 4);

    let drafts: Vec<&Spell> = page.spells.iter().filter(|s| s.is_draft()).collect();
    assert_eq!(drafts.len(), 2);
    assert!(drafts.iter().any(|s| s.id == s1.id));
    assert!(drafts.iter().any(|s| s.id == s2.id));

    let copies: Vec<&Spell> = page
        .spells
        .iter()
        .filter(|s| s.release_id == Some(r1))
        .collect();
    assert_eq!(copies.len(), 2);

    let a1_after = h.service.get(&a1.id).await.unwrap();
    assert_eq!(a1_after.current_release_id, Some(r1));
}

#[tokio::test]
async fn find_normalizes_the_null_sentinel() {
    let h = harness();
    let unreleased = h.create_agent("unreleased").await;
    let released = h.create_agent("released").await;
    h.store
        .insert_spell(&Spell::draft(
            released.project_id,
            released.id,
            "s",
            json!({}),
        ))
        .await
        .unwrap();
    h.service
        .create_release(CreateRelease {
            agent_id: released.id,
            description: String::new(),
            source_agent_id: released.id,
        })
        .await
        .unwrap();

    let found = h
        .service
        .find(AgentQuery {
            filters: json!({"current_release_id": "null"})
                .as_object()
                .cloned()
                .unwrap(),
            paginate: true,
        })
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, unreleased.id);
}

#[tokio::test]
async fn commands_are_authorized_before_dispatch() {
    let h = harness();
    let agent = h.create_agent("runner").await;
    let foreign_ctx = CallerContext::rest(ProjectId::new());

    let err = h
        .service
        .command(
            &AgentCommand::new(agent.id, "agent:run", json!({})),
            &foreign_ctx,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::NotAuthenticated(_)));
    assert!(h.dispatcher.calls().is_empty());
}

#[tokio::test]
async fn message_routes_to_the_dispatcher() {
    let h = harness();
    let agent = h.create_agent("speaker").await;

    let ack = h
        .service
        .message(
            &MessagePayload {
                agent_id: Some(agent.id),
                payload: json!({"content": "hello"}),
            },
            &CallerContext::rest(agent.project_id),
        )
        .await
        .unwrap();

    assert!(ack.success);
    assert!(matches!(
        h.dispatcher.calls().as_slice(),
        [DispatchCall::Message { .. }]
    ));
}

#[tokio::test]
async fn moving_a_connection_between_agents_toggles_live_modes() {
    let h = harness();
    let a = h.create_agent("a").await;
    let b = h
        .service
        .create(CreateAgent {
            project_id: a.project_id,
            name: "b".to_string(),
            enabled: None,
            data: None,
        })
        .await
        .unwrap();
    let connection = stub_connection();
    let ctx = CallerContext::socket(a.project_id, connection.clone());

    h.service.subscribe(Some(&a.id), &ctx).await.unwrap();
    let outcome = h.service.subscribe(Some(&b.id), &ctx).await.unwrap();

    assert_eq!(outcome.evicted_agent, Some(a.id));
    assert!(outcome.live_enabled);
    assert_eq!(h.service.channels().occupant(&a.id), None);
    assert_eq!(h.service.channels().occupant(&b.id), Some(connection.id()));

    let toggles: Vec<(AgentId, bool)> = h
        .dispatcher
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            DispatchCall::Command {
                agent_id,
                command,
                data,
            } if command == "agent:spellbook:toggleLive" => {
                Some((agent_id, data["live"].as_bool().unwrap()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(toggles, vec![(a.id, true), (a.id, false), (b.id, true)]);
}

#[tokio::test]
async fn subscribe_is_rejected_off_realtime_transports() {
    let h = harness();
    let agent = h.create_agent("a").await;

    let err = h
        .service
        .subscribe(Some(&agent.id), &CallerContext::rest(agent.project_id))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::InvalidOperation(_)));
}

#[tokio::test]
async fn seraph_events_round_through_the_service() {
    let h = harness();
    let agent = h.create_agent("seer").await;
    let event = SeraphEvent::new(agent.id, json!({"kind": "insight"}));

    assert!(h.service.create_seraph_event(&event).await.unwrap());

    let events = h.service.get_seraph_events(Some(&agent.id)).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, json!({"kind": "insight"}));
    // Recording also notified the dispatcher for live processing.
    assert!(h
        .dispatcher
        .calls()
        .iter()
        .any(|c| matches!(c, DispatchCall::ProcessSeraphEvent { .. })));

    assert!(h
        .service
        .delete_seraph_event(Some(&events[0].id))
        .await
        .unwrap());
    assert!(h
        .service
        .get_seraph_events(Some(&agent.id))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn remove_deletes_the_agent() {
    let h = harness();
    let agent = h.create_agent("mortal").await;

    h.service.remove(&agent.id).await.unwrap();

    let err = h.service.get(&agent.id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}
