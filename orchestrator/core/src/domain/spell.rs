// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Spell Entity
//!
//! A named executable graph. A spell with `release_id == None` is a draft
//! and may be edited; once a spell carries a release id it is frozen and is
//! never mutated in place. Behavior changes land on drafts only and reach a
//! release through [`Spell::duplicate_for_release`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::domain::agent::{AgentId, ProjectId};
use crate::domain::release::ReleaseId;

pub const DEFAULT_SPELL_TYPE: &str = "spell";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpellId(pub Uuid);

impl SpellId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SpellId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    pub id: SpellId,
    pub name: String,
    pub project_id: ProjectId,
    pub agent_id: AgentId,
    /// `None` marks a draft. `Some` binds the spell to an immutable release.
    pub release_id: Option<ReleaseId>,
    pub spell_type: Option<String>,
    pub graph: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Spell {
    pub fn draft(
        project_id: ProjectId,
        agent_id: AgentId,
        name: impl Into<String>,
        graph: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SpellId::new(),
            name: name.into(),
            project_id,
            agent_id,
            release_id: None,
            spell_type: Some(DEFAULT_SPELL_TYPE.to_string()),
            graph,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.release_id.is_none()
    }

    /// Copy this spell into a release: new identity, fresh timestamps, the
    /// release binding set, `spell_type` defaulted when absent. Every other
    /// field is preserved verbatim.
    pub fn duplicate_for_release(&self, release_id: ReleaseId) -> Spell {
        let now = Utc::now();
        Spell {
            id: SpellId::new(),
            name: self.name.clone(),
            project_id: self.project_id,
            agent_id: self.agent_id,
            release_id: Some(release_id),
            spell_type: Some(
                self.spell_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SPELL_TYPE.to_string()),
            ),
            graph: self.graph.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_preserves_fields_and_rebinds_identity() {
        let spell = Spell::draft(
            ProjectId::new(),
            AgentId::new(),
            "summon",
            json!({"nodes": [1, 2, 3]}),
        );
        let release_id = ReleaseId::new();

        let copy = spell.duplicate_for_release(release_id);

        assert_ne!(copy.id, spell.id);
        assert_eq!(copy.release_id, Some(release_id));
        assert_eq!(copy.name, spell.name);
        assert_eq!(copy.graph, spell.graph);
        assert_eq!(copy.project_id, spell.project_id);
        assert_eq!(copy.agent_id, spell.agent_id);
        assert!(!copy.is_draft());
        assert!(spell.is_draft());
    }

    #[test]
    fn duplicate_defaults_missing_spell_type() {
        let mut spell = Spell::draft(ProjectId::new(), AgentId::new(), "scry", json!({}));
        spell.spell_type = None;

        let copy = spell.duplicate_for_release(ReleaseId::new());

        assert_eq!(copy.spell_type.as_deref(), Some(DEFAULT_SPELL_TYPE));
    }
}
