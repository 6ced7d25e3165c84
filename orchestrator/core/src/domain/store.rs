// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Store Ports
//!
//! Persistence contracts for the relational store collaborator, one trait
//! per aggregate plus a transaction port for release creation:
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `AgentStore` | `Agent` | `InMemoryStore`, `PostgresStore` |
//! | `SpellStore` | `Spell` | `InMemoryStore`, `PostgresStore` |
//! | `SeraphEventStore` | `SeraphEvent` | `InMemoryStore`, `PostgresStore` |
//! | `TransactionalStore` / `ReleaseTx` | release fork | `InMemoryStore`, `PostgresStore` |
//!
//! Spell listing is page-based: the store returns a finite page plus a
//! continuation; callers needing every row loop until the continuation is
//! exhausted. Every method is a suspension point; callers must not hold an
//! in-memory lock across it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::agent::{Agent, AgentId, AgentPatch, AgentQuery, ProjectId};
use crate::domain::release::{Release, ReleaseId};
use crate::domain::seraph::{SeraphEvent, SeraphEventId};
use crate::domain::spell::Spell;

/// One page of a spell listing.
#[derive(Debug, Clone)]
pub struct SpellPage {
    pub spells: Vec<Spell>,
    /// Continuation for the next page; `None` when the listing is exhausted.
    pub next: Option<PageRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpellQuery {
    pub project_id: ProjectId,
    pub agent_id: AgentId,
}

#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn get_agent(&self, id: &AgentId) -> Result<Option<Agent>, StoreError>;

    /// Filtered listing. The query must already be normalized
    /// ([`AgentQuery::normalized`]); the store applies default pagination
    /// unless the query opted out.
    async fn find_agents(&self, query: &AgentQuery) -> Result<Vec<Agent>, StoreError>;

    /// Insert and return the stored row.
    async fn insert_agent(&self, agent: &Agent) -> Result<Agent, StoreError>;

    /// Full replace of an existing row.
    async fn update_agent(&self, agent: &Agent) -> Result<Agent, StoreError>;

    /// Partial update; returns the row after the patch.
    async fn patch_agent(&self, id: &AgentId, patch: &AgentPatch) -> Result<Agent, StoreError>;

    async fn delete_agent(&self, id: &AgentId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SpellStore: Send + Sync {
    async fn insert_spell(&self, spell: &Spell) -> Result<Spell, StoreError>;

    async fn list_spells(
        &self,
        query: &SpellQuery,
        page: PageRequest,
    ) -> Result<SpellPage, StoreError>;
}

#[async_trait]
pub trait SeraphEventStore: Send + Sync {
    /// Append-only insert; returns the stored row.
    async fn insert_seraph_event(&self, event: &SeraphEvent) -> Result<SeraphEvent, StoreError>;

    /// The most recent `limit` rows for the agent, ascending by creation
    /// time within that window.
    async fn list_seraph_events(
        &self,
        agent_id: &AgentId,
        limit: usize,
    ) -> Result<Vec<SeraphEvent>, StoreError>;

    /// Returns the number of rows removed.
    async fn delete_seraph_event(&self, id: &SeraphEventId) -> Result<u64, StoreError>;
}

/// Entry point for the multi-statement release transaction.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    async fn begin_release(&self) -> Result<Box<dyn ReleaseTx>, StoreError>;
}

/// Transaction-scoped operations used while forking a release. Nothing
/// performed through this handle is visible until `commit`; dropping the
/// handle or calling `rollback` discards all of it.
#[async_trait]
pub trait ReleaseTx: Send {
    async fn get_agent(&mut self, id: &AgentId) -> Result<Option<Agent>, StoreError>;

    async fn insert_release(&mut self, release: &Release) -> Result<Release, StoreError>;

    async fn list_spells(
        &mut self,
        query: &SpellQuery,
        page: PageRequest,
    ) -> Result<SpellPage, StoreError>;

    async fn insert_spell(&mut self, spell: &Spell) -> Result<Spell, StoreError>;

    async fn set_current_release(
        &mut self,
        agent_id: &AgentId,
        release_id: &ReleaseId,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Row not found".to_string()),
            _ => StoreError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
