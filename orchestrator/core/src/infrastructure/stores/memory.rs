// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # In-Memory Store
//!
//! Development/testing implementation of every store port. State lives in a
//! single mutex-guarded struct; the release transaction works on a clone of
//! that state and swaps it in atomically on commit, so a failed transaction
//! leaves nothing partial behind.
//!
//! Fail points let tests abort the transaction at a chosen operation to
//! exercise rollback behavior. The lock is never held across an `.await`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::agent::{Agent, AgentId, AgentPatch, AgentQuery};
use crate::domain::release::{Release, ReleaseId};
use crate::domain::seraph::{SeraphEvent, SeraphEventId};
use crate::domain::spell::Spell;
use crate::domain::store::{
    AgentStore, PageRequest, ReleaseTx, SeraphEventStore, SpellPage, SpellQuery, SpellStore,
    StoreError, TransactionalStore,
};

/// Operation inside the release transaction at which an injected failure
/// fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertRelease,
    InsertSpell,
    SetCurrentRelease,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemState {
    agents: HashMap<AgentId, Agent>,
    spells: Vec<Spell>,
    releases: HashMap<ReleaseId, Release>,
    seraph_events: Vec<SeraphEvent>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemState>>,
    fail_point: Arc<Mutex<Option<FailPoint>>>,
    writes: Arc<Mutex<u64>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot failure at the given transaction operation.
    pub fn fail_on(&self, point: FailPoint) {
        *self.fail_point.lock() = Some(point);
    }

    /// Number of write operations performed, transaction commits included.
    pub fn write_count(&self) -> u64 {
        *self.writes.lock()
    }

    pub fn all_spells(&self) -> Vec<Spell> {
        self.state.lock().spells.clone()
    }

    pub fn all_releases(&self) -> Vec<Release> {
        self.state.lock().releases.values().cloned().collect()
    }

    fn record_write(&self) {
        *self.writes.lock() += 1;
    }

    fn take_fail_point(&self, at: FailPoint) -> Option<StoreError> {
        let mut armed = self.fail_point.lock();
        if *armed == Some(at) {
            *armed = None;
            return Some(StoreError::Database(format!("injected fault at {at:?}")));
        }
        None
    }
}

fn matches_filter(agent: &Agent, key: &str, value: &serde_json::Value) -> Result<bool, StoreError> {
    let matched = match key {
        "id" => value.as_str() == Some(agent.id.to_string().as_str()),
        "project_id" => value.as_str() == Some(agent.project_id.to_string().as_str()),
        "name" => value.as_str() == Some(agent.name.as_str()),
        "enabled" => value.as_bool() == Some(agent.enabled),
        "current_release_id" => match agent.current_release_id {
            Some(id) => value.as_str() == Some(id.to_string().as_str()),
            None => value.is_null(),
        },
        other => {
            return Err(StoreError::InvalidQuery(format!(
                "unsupported filter column: {other}"
            )))
        }
    };
    Ok(matched)
}

fn page_spells(spells: &[Spell], query: &SpellQuery, page: PageRequest) -> SpellPage {
    let mut matched: Vec<Spell> = spells
        .iter()
        .filter(|s| s.project_id == query.project_id && s.agent_id == query.agent_id)
        .cloned()
        .collect();
    matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.0.cmp(&b.id.0)));

    let total = matched.len();
    let start = page.offset.min(total);
    let end = (page.offset + page.limit).min(total);
    let next = (end < total).then(|| PageRequest {
        offset: end,
        limit: page.limit,
    });

    SpellPage {
        spells: matched[start..end].to_vec(),
        next,
    }
}

#[async_trait]
impl AgentStore for InMemoryStore {
    async fn get_agent(&self, id: &AgentId) -> Result<Option<Agent>, StoreError> {
        Ok(self.state.lock().agents.get(id).cloned())
    }

    async fn find_agents(&self, query: &AgentQuery) -> Result<Vec<Agent>, StoreError> {
        let state = self.state.lock();
        let mut matched = Vec::new();
        'agents: for agent in state.agents.values() {
            for (key, value) in &query.filters {
                if !matches_filter(agent, key, value)? {
                    continue 'agents;
                }
            }
            matched.push(agent.clone());
        }
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.0.cmp(&b.id.0)));
        Ok(matched)
    }

    async fn insert_agent(&self, agent: &Agent) -> Result<Agent, StoreError> {
        self.record_write();
        self.state.lock().agents.insert(agent.id, agent.clone());
        Ok(agent.clone())
    }

    async fn update_agent(&self, agent: &Agent) -> Result<Agent, StoreError> {
        self.record_write();
        let mut state = self.state.lock();
        if !state.agents.contains_key(&agent.id) {
            return Err(StoreError::NotFound(format!("Agent {}", agent.id)));
        }
        state.agents.insert(agent.id, agent.clone());
        Ok(agent.clone())
    }

    async fn patch_agent(&self, id: &AgentId, patch: &AgentPatch) -> Result<Agent, StoreError> {
        self.record_write();
        let mut state = self.state.lock();
        let agent = state
            .agents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("Agent {id}")))?;
        agent.apply(patch);
        Ok(agent.clone())
    }

    async fn delete_agent(&self, id: &AgentId) -> Result<(), StoreError> {
        self.record_write();
        let mut state = self.state.lock();
        state
            .agents
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("Agent {id}")))?;
        Ok(())
    }
}

#[async_trait]
impl SpellStore for InMemoryStore {
    async fn insert_spell(&self, spell: &Spell) -> Result<Spell, StoreError> {
        self.record_write();
        self.state.lock().spells.push(spell.clone());
        Ok(spell.clone())
    }

    async fn list_spells(
        &self,
        query: &SpellQuery,
        page: PageRequest,
    ) -> Result<SpellPage, StoreError> {
        Ok(page_spells(&self.state.lock().spells, query, page))
    }
}

#[async_trait]
impl SeraphEventStore for InMemoryStore {
    async fn insert_seraph_event(&self, event: &SeraphEvent) -> Result<SeraphEvent, StoreError> {
        self.record_write();
        self.state.lock().seraph_events.push(event.clone());
        Ok(event.clone())
    }

    async fn list_seraph_events(
        &self,
        agent_id: &AgentId,
        limit: usize,
    ) -> Result<Vec<SeraphEvent>, StoreError> {
        let state = self.state.lock();
        let mut events: Vec<SeraphEvent> = state
            .seraph_events
            .iter()
            .filter(|e| e.agent_id == *agent_id)
            .cloned()
            .collect();
        // Most recent `limit` rows, ascending within the window.
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events.truncate(limit);
        events.reverse();
        Ok(events)
    }

    async fn delete_seraph_event(&self, id: &SeraphEventId) -> Result<u64, StoreError> {
        self.record_write();
        let mut state = self.state.lock();
        let before = state.seraph_events.len();
        state.seraph_events.retain(|e| e.id != *id);
        Ok((before - state.seraph_events.len()) as u64)
    }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    async fn begin_release(&self) -> Result<Box<dyn ReleaseTx>, StoreError> {
        let staged = self.state.lock().clone();
        Ok(Box::new(MemReleaseTx {
            store: self.clone(),
            staged,
        }))
    }
}

/// Copy-on-commit transaction: all operations mutate a private clone of the
/// store state, published in one swap on commit.
struct MemReleaseTx {
    store: InMemoryStore,
    staged: MemState,
}

#[async_trait]
impl ReleaseTx for MemReleaseTx {
    async fn get_agent(&mut self, id: &AgentId) -> Result<Option<Agent>, StoreError> {
        Ok(self.staged.agents.get(id).cloned())
    }

    async fn insert_release(&mut self, release: &Release) -> Result<Release, StoreError> {
        if let Some(err) = self.store.take_fail_point(FailPoint::InsertRelease) {
            return Err(err);
        }
        self.staged.releases.insert(release.id, release.clone());
        Ok(release.clone())
    }

    async fn list_spells(
        &mut self,
        query: &SpellQuery,
        page: PageRequest,
    ) -> Result<SpellPage, StoreError> {
        Ok(page_spells(&self.staged.spells, query, page))
    }

    async fn insert_spell(&mut self, spell: &Spell) -> Result<Spell, StoreError> {
        if let Some(err) = self.store.take_fail_point(FailPoint::InsertSpell) {
            return Err(err);
        }
        self.staged.spells.push(spell.clone());
        Ok(spell.clone())
    }

    async fn set_current_release(
        &mut self,
        agent_id: &AgentId,
        release_id: &ReleaseId,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(err) = self.store.take_fail_point(FailPoint::SetCurrentRelease) {
            return Err(err);
        }
        let agent = self
            .staged
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| StoreError::NotFound(format!("Agent {agent_id}")))?;
        agent.current_release_id = Some(*release_id);
        agent.updated_at = updated_at;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if let Some(err) = self.store.take_fail_point(FailPoint::Commit) {
            return Err(err);
        }
        self.store.record_write();
        *self.store.state.lock() = self.staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Dropping the staged clone discards everything.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::ProjectId;
    use serde_json::json;

    #[tokio::test]
    async fn listing_pages_terminate() {
        let store = InMemoryStore::new();
        let project_id = ProjectId::new();
        let agent_id = AgentId::new();
        for i in 0..5 {
            store
                .insert_spell(&Spell::draft(project_id, agent_id, format!("s{i}"), json!({})))
                .await
                .unwrap();
        }
        let query = SpellQuery {
            project_id,
            agent_id,
        };

        let first = store
            .list_spells(&query, PageRequest::first(2))
            .await
            .unwrap();
        assert_eq!(first.spells.len(), 2);
        let second = store
            .list_spells(&query, first.next.unwrap())
            .await
            .unwrap();
        assert_eq!(second.spells.len(), 2);
        let third = store
            .list_spells(&query, second.next.unwrap())
            .await
            .unwrap();
        assert_eq!(third.spells.len(), 1);
        assert!(third.next.is_none());
    }

    #[test]
    fn uncommitted_transactions_are_invisible() {
        tokio_test::block_on(async {
            let store = InMemoryStore::new();
            let agent = Agent::new(ProjectId::new(), "ghost", json!({}));
            store.insert_agent(&agent).await.unwrap();

            let mut tx = store.begin_release().await.unwrap();
            tx.insert_release(&Release::new(agent.id, agent.project_id, "wip"))
                .await
                .unwrap();
            drop(tx);

            assert!(store.all_releases().is_empty());
        });
    }

    #[tokio::test]
    async fn find_agents_rejects_unknown_columns() {
        let store = InMemoryStore::new();
        let query = AgentQuery {
            filters: json!({"shoe_size": 42}).as_object().cloned().unwrap(),
            paginate: true,
        };

        assert!(matches!(
            store.find_agents(&query).await,
            Err(StoreError::InvalidQuery(_))
        ));
    }
}
