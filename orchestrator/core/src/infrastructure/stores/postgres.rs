// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Store
//!
//! Production implementation of the store ports over `sqlx`, backed by the
//! `agents`, `spells`, `spell_releases`, and `seraph_events` tables. The
//! release transaction wraps a real `sqlx::Transaction`; nothing inside it
//! is visible until commit. Schema migrations are owned by the deployment,
//! not this crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{QueryBuilder, Row, Transaction};
use uuid::Uuid;

use crate::domain::agent::{Agent, AgentId, AgentPatch, AgentQuery, ProjectId};
use crate::domain::release::{Release, ReleaseId};
use crate::domain::seraph::{SeraphEvent, SeraphEventId};
use crate::domain::spell::Spell;
use crate::domain::store::{
    AgentStore, PageRequest, ReleaseTx, SeraphEventStore, SpellPage, SpellQuery, SpellStore,
    StoreError, TransactionalStore,
};

const AGENT_COLUMNS: &str =
    "id, project_id, name, enabled, current_release_id, data, created_at, updated_at";
const SPELL_COLUMNS: &str =
    "id, name, project_id, agent_id, release_id, spell_type, graph, created_at, updated_at";

pub struct PostgresStore {
    pool: PgPool,
    find_limit: usize,
}

impl PostgresStore {
    pub fn new(pool: PgPool, find_limit: usize) -> Self {
        Self { pool, find_limit }
    }
}

fn agent_from_row(row: &PgRow) -> Agent {
    Agent {
        id: AgentId(row.get::<Uuid, _>("id")),
        project_id: ProjectId(row.get::<Uuid, _>("project_id")),
        name: row.get("name"),
        enabled: row.get("enabled"),
        current_release_id: row
            .get::<Option<Uuid>, _>("current_release_id")
            .map(ReleaseId),
        data: row.get::<Value, _>("data"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    }
}

fn spell_from_row(row: &PgRow) -> Spell {
    Spell {
        id: crate::domain::spell::SpellId(row.get::<Uuid, _>("id")),
        name: row.get("name"),
        project_id: ProjectId(row.get::<Uuid, _>("project_id")),
        agent_id: AgentId(row.get::<Uuid, _>("agent_id")),
        release_id: row.get::<Option<Uuid>, _>("release_id").map(ReleaseId),
        spell_type: row.get::<Option<String>, _>("spell_type"),
        graph: row.get::<Value, _>("graph"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    }
}

fn seraph_event_from_row(row: &PgRow) -> SeraphEvent {
    SeraphEvent {
        id: SeraphEventId(row.get::<Uuid, _>("id")),
        agent_id: AgentId(row.get::<Uuid, _>("agent_id")),
        data: row.get::<Value, _>("data"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    }
}

fn filter_uuid(value: &Value, column: &str) -> Result<Uuid, StoreError> {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| StoreError::InvalidQuery(format!("{column} filter must be a UUID string")))
}

/// Append `WHERE`/`AND` clauses for a normalized agent filter bag. Columns
/// outside the whitelist are rejected rather than interpolated.
fn push_agent_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    query: &AgentQuery,
) -> Result<(), StoreError> {
    let mut first = true;
    for (key, value) in &query.filters {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;
        match (key.as_str(), value) {
            ("id", v) => {
                qb.push("id = ");
                qb.push_bind(filter_uuid(v, "id")?);
            }
            ("project_id", v) => {
                qb.push("project_id = ");
                qb.push_bind(filter_uuid(v, "project_id")?);
            }
            ("name", Value::String(name)) => {
                qb.push("name = ");
                qb.push_bind(name.clone());
            }
            ("enabled", Value::Bool(enabled)) => {
                qb.push("enabled = ");
                qb.push_bind(*enabled);
            }
            ("current_release_id", Value::Null) => {
                qb.push("current_release_id IS NULL");
            }
            ("current_release_id", v) => {
                qb.push("current_release_id = ");
                qb.push_bind(filter_uuid(v, "current_release_id")?);
            }
            (other, _) => {
                return Err(StoreError::InvalidQuery(format!(
                    "unsupported filter column: {other}"
                )))
            }
        }
    }
    Ok(())
}

async fn list_spells_with<'e, E>(
    executor: E,
    query: &SpellQuery,
    page: PageRequest,
) -> Result<SpellPage, StoreError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    // Fetch one extra row to learn whether a continuation exists without a
    // separate COUNT.
    let rows = sqlx::query(&format!(
        "SELECT {SPELL_COLUMNS} FROM spells \
         WHERE project_id = $1 AND agent_id = $2 \
         ORDER BY created_at ASC, id ASC \
         OFFSET $3 LIMIT $4"
    ))
    .bind(query.project_id.0)
    .bind(query.agent_id.0)
    .bind(page.offset as i64)
    .bind(page.limit as i64 + 1)
    .fetch_all(executor)
    .await?;

    let more = rows.len() > page.limit;
    let spells: Vec<Spell> = rows.iter().take(page.limit).map(spell_from_row).collect();
    let next = more.then(|| PageRequest {
        offset: page.offset + page.limit,
        limit: page.limit,
    });
    Ok(SpellPage { spells, next })
}

#[async_trait]
impl AgentStore for PostgresStore {
    async fn get_agent(&self, id: &AgentId) -> Result<Option<Agent>, StoreError> {
        let row = sqlx::query(&format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(agent_from_row))
    }

    async fn find_agents(&self, query: &AgentQuery) -> Result<Vec<Agent>, StoreError> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {AGENT_COLUMNS} FROM agents"));
        push_agent_filters(&mut qb, query)?;
        qb.push(" ORDER BY created_at ASC, id ASC");
        if query.paginate {
            qb.push(" LIMIT ");
            qb.push_bind(self.find_limit as i64);
        }
        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(agent_from_row).collect())
    }

    async fn insert_agent(&self, agent: &Agent) -> Result<Agent, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO agents ({AGENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {AGENT_COLUMNS}"
        ))
        .bind(agent.id.0)
        .bind(agent.project_id.0)
        .bind(&agent.name)
        .bind(agent.enabled)
        .bind(agent.current_release_id.map(|id| id.0))
        .bind(&agent.data)
        .bind(agent.created_at)
        .bind(agent.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(agent_from_row(&row))
    }

    async fn update_agent(&self, agent: &Agent) -> Result<Agent, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE agents SET project_id = $2, name = $3, enabled = $4, \
             current_release_id = $5, data = $6, updated_at = $7 \
             WHERE id = $1 RETURNING {AGENT_COLUMNS}"
        ))
        .bind(agent.id.0)
        .bind(agent.project_id.0)
        .bind(&agent.name)
        .bind(agent.enabled)
        .bind(agent.current_release_id.map(|id| id.0))
        .bind(&agent.data)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("Agent {}", agent.id)))?;
        Ok(agent_from_row(&row))
    }

    async fn patch_agent(&self, id: &AgentId, patch: &AgentPatch) -> Result<Agent, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE agents SET ");
        let mut fields = qb.separated(", ");
        if let Some(name) = &patch.name {
            fields.push("name = ");
            fields.push_bind_unseparated(name.clone());
        }
        if let Some(enabled) = patch.enabled {
            fields.push("enabled = ");
            fields.push_bind_unseparated(enabled);
        }
        if let Some(release_id) = patch.current_release_id {
            fields.push("current_release_id = ");
            fields.push_bind_unseparated(release_id.0);
        }
        if let Some(data) = &patch.data {
            fields.push("data = ");
            fields.push_bind_unseparated(data.clone());
        }
        fields.push("updated_at = ");
        fields.push_bind_unseparated(patch.updated_at.unwrap_or_else(Utc::now));

        qb.push(" WHERE id = ");
        qb.push_bind(id.0);
        qb.push(format!(" RETURNING {AGENT_COLUMNS}"));

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Agent {id}")))?;
        Ok(agent_from_row(&row))
    }

    async fn delete_agent(&self, id: &AgentId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM agents WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Agent {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl SpellStore for PostgresStore {
    async fn insert_spell(&self, spell: &Spell) -> Result<Spell, StoreError> {
        let row = insert_spell_query(spell).fetch_one(&self.pool).await?;
        Ok(spell_from_row(&row))
    }

    async fn list_spells(
        &self,
        query: &SpellQuery,
        page: PageRequest,
    ) -> Result<SpellPage, StoreError> {
        list_spells_with(&self.pool, query, page).await
    }
}

fn insert_spell_query(
    spell: &Spell,
) -> sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        "INSERT INTO spells (id, name, project_id, agent_id, release_id, spell_type, graph, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id, name, project_id, agent_id, release_id, spell_type, graph, created_at, updated_at",
    )
    .bind(spell.id.0)
    .bind(&spell.name)
    .bind(spell.project_id.0)
    .bind(spell.agent_id.0)
    .bind(spell.release_id.map(|id| id.0))
    .bind(&spell.spell_type)
    .bind(&spell.graph)
    .bind(spell.created_at)
    .bind(spell.updated_at)
}

#[async_trait]
impl SeraphEventStore for PostgresStore {
    async fn insert_seraph_event(&self, event: &SeraphEvent) -> Result<SeraphEvent, StoreError> {
        let row = sqlx::query(
            "INSERT INTO seraph_events (id, agent_id, data, created_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, agent_id, data, created_at",
        )
        .bind(event.id.0)
        .bind(event.agent_id.0)
        .bind(&event.data)
        .bind(event.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(seraph_event_from_row(&row))
    }

    async fn list_seraph_events(
        &self,
        agent_id: &AgentId,
        limit: usize,
    ) -> Result<Vec<SeraphEvent>, StoreError> {
        // Most recent rows, returned ascending within the window.
        let rows = sqlx::query(
            "SELECT id, agent_id, data, created_at FROM ( \
                SELECT id, agent_id, data, created_at FROM seraph_events \
                WHERE agent_id = $1 ORDER BY created_at DESC LIMIT $2 \
             ) AS recent ORDER BY created_at ASC",
        )
        .bind(agent_id.0)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(seraph_event_from_row).collect())
    }

    async fn delete_seraph_event(&self, id: &SeraphEventId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM seraph_events WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TransactionalStore for PostgresStore {
    async fn begin_release(&self) -> Result<Box<dyn ReleaseTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresReleaseTx { tx }))
    }
}

struct PostgresReleaseTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ReleaseTx for PostgresReleaseTx {
    async fn get_agent(&mut self, id: &AgentId) -> Result<Option<Agent>, StoreError> {
        let row = sqlx::query(&format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.as_ref().map(agent_from_row))
    }

    async fn insert_release(&mut self, release: &Release) -> Result<Release, StoreError> {
        let row = sqlx::query(
            "INSERT INTO spell_releases (id, agent_id, project_id, description, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, agent_id, project_id, description, created_at",
        )
        .bind(release.id.0)
        .bind(release.agent_id.0)
        .bind(release.project_id.0)
        .bind(&release.description)
        .bind(release.created_at)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(Release {
            id: ReleaseId(row.get::<Uuid, _>("id")),
            agent_id: AgentId(row.get::<Uuid, _>("agent_id")),
            project_id: ProjectId(row.get::<Uuid, _>("project_id")),
            description: row.get("description"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }

    async fn list_spells(
        &mut self,
        query: &SpellQuery,
        page: PageRequest,
    ) -> Result<SpellPage, StoreError> {
        list_spells_with(&mut *self.tx, query, page).await
    }

    async fn insert_spell(&mut self, spell: &Spell) -> Result<Spell, StoreError> {
        let row = insert_spell_query(spell).fetch_one(&mut *self.tx).await?;
        Ok(spell_from_row(&row))
    }

    async fn set_current_release(
        &mut self,
        agent_id: &AgentId,
        release_id: &ReleaseId,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE agents SET current_release_id = $2, updated_at = $3 WHERE id = $1")
                .bind(agent_id.0)
                .bind(release_id.0)
                .bind(updated_at)
                .execute(&mut *self.tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Agent {agent_id}")));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
