// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Release Manager
//!
//! Forks an agent's draft spell set into a new immutable release inside a
//! single store transaction: insert the release row, exhaustively collect
//! every page of the source agent's spells, duplicate the drafts against the
//! new release, and repoint the agent's `current_release_id`. Any failure
//! rolls the whole transaction back; nothing partial becomes visible.
//!
//! After the commit a best-effort patch notification of the new pointer is
//! issued outside the transaction so downstream caches see the change. Its
//! failure is logged, never fatal.
//!
//! Concurrent calls on one agent are not serialized here; the last commit
//! wins the `current_release_id` update (accepted race, see DESIGN.md).

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::agent::{AgentId, AgentPatch};
use crate::domain::error::CoreError;
use crate::domain::release::{Release, ReleaseId};
use crate::domain::spell::Spell;
use crate::domain::store::{
    AgentStore, PageRequest, ReleaseTx, SpellQuery, TransactionalStore,
};

/// Page size used while draining the store's spell listing.
const SPELL_PAGE_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct CreateRelease {
    pub agent_id: AgentId,
    pub description: String,
    /// Agent whose draft spells seed the release; may equal `agent_id`.
    pub source_agent_id: AgentId,
}

pub struct ReleaseManager {
    store: Arc<dyn TransactionalStore>,
    agents: Arc<dyn AgentStore>,
}

impl ReleaseManager {
    pub fn new(store: Arc<dyn TransactionalStore>, agents: Arc<dyn AgentStore>) -> Self {
        Self { store, agents }
    }

    pub async fn create_release(&self, request: CreateRelease) -> Result<ReleaseId, CoreError> {
        let mut tx = self
            .store
            .begin_release()
            .await
            .map_err(|e| CoreError::Transaction(e.to_string()))?;

        match Self::fork_release(tx.as_mut(), &request).await {
            Ok(release_id) => {
                tx.commit()
                    .await
                    .map_err(|e| CoreError::Transaction(e.to_string()))?;
                info!(
                    agent_id = %request.agent_id,
                    release_id = %release_id,
                    "created spell release"
                );
                self.notify_release(&request.agent_id, release_id).await;
                Ok(release_id)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        agent_id = %request.agent_id,
                        error = %rollback_err,
                        "rollback after failed release creation also failed"
                    );
                }
                match err {
                    CoreError::NotFound(_) => Err(err),
                    other => Err(CoreError::Transaction(other.to_string())),
                }
            }
        }
    }

    async fn fork_release(
        tx: &mut dyn ReleaseTx,
        request: &CreateRelease,
    ) -> Result<ReleaseId, CoreError> {
        let target = tx
            .get_agent(&request.agent_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Agent {} not found", request.agent_id)))?;
        let source = tx.get_agent(&request.source_agent_id).await?.ok_or_else(|| {
            CoreError::not_found(format!("Agent {} not found", request.source_agent_id))
        })?;

        let release = tx
            .insert_release(&Release::new(
                target.id,
                target.project_id,
                request.description.clone(),
            ))
            .await?;

        let spells = Self::collect_all_spells(
            tx,
            SpellQuery {
                project_id: target.project_id,
                agent_id: source.id,
            },
        )
        .await?;

        let drafts: Vec<&Spell> = spells.iter().filter(|spell| spell.is_draft()).collect();
        debug!(
            release_id = %release.id,
            total = spells.len(),
            drafts = drafts.len(),
            "duplicating draft spells into release"
        );
        for spell in drafts {
            tx.insert_spell(&spell.duplicate_for_release(release.id))
                .await?;
        }

        tx.set_current_release(&target.id, &release.id, Utc::now())
            .await?;

        Ok(release.id)
    }

    /// Drain every page of the listing. A partial collection would silently
    /// drop spells from the release, so the loop only stops when the store
    /// reports no continuation.
    async fn collect_all_spells(
        tx: &mut dyn ReleaseTx,
        query: SpellQuery,
    ) -> Result<Vec<Spell>, CoreError> {
        let mut spells = Vec::new();
        let mut page = PageRequest::first(SPELL_PAGE_LIMIT);
        loop {
            let batch = tx.list_spells(&query, page).await?;
            spells.extend(batch.spells);
            match batch.next {
                Some(next) => page = next,
                None => break,
            }
        }
        Ok(spells)
    }

    /// Post-commit change notification. The release is already durable;
    /// a failure here is reported and left for eventual convergence.
    async fn notify_release(&self, agent_id: &AgentId, release_id: ReleaseId) {
        let patch = AgentPatch {
            current_release_id: Some(release_id),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        if let Err(err) = self.agents.patch_agent(agent_id, &patch).await {
            warn!(
                agent_id = %agent_id,
                release_id = %release_id,
                error = %err,
                "post-commit release notification failed"
            );
        }
    }
}
