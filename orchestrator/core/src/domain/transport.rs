// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Transport Collaborator Types
//!
//! Caller context and connection handle supplied by the transport layer.
//! Collaborators are injected explicitly; the core has no process-global
//! registry of connections or providers.

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::agent::ProjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle to an externally owned live connection. The core keeps references
/// to connections but never lifecycles them; the transport removes a closed
/// connection from any channel on its own.
pub trait Connection: Send + Sync {
    fn id(&self) -> ConnectionId;
}

/// Where a call originated. Internal service calls carry no provider and
/// bypass the project-scope boundary check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Rest,
    Socket,
}

impl Provider {
    pub fn is_realtime(self) -> bool {
        matches!(self, Provider::Socket)
    }
}

#[derive(Clone)]
pub struct CallerContext {
    pub provider: Option<Provider>,
    /// Project the caller is scoped to, when the transport authenticated
    /// one. Externally-originated calls without it fall back to the agent's
    /// own project.
    pub project_id: Option<ProjectId>,
    pub connection: Option<Arc<dyn Connection>>,
}

impl CallerContext {
    pub fn internal() -> Self {
        Self {
            provider: None,
            project_id: None,
            connection: None,
        }
    }

    pub fn rest(project_id: ProjectId) -> Self {
        Self {
            provider: Some(Provider::Rest),
            project_id: Some(project_id),
            connection: None,
        }
    }

    pub fn socket(project_id: ProjectId, connection: Arc<dyn Connection>) -> Self {
        Self {
            provider: Some(Provider::Socket),
            project_id: Some(project_id),
            connection: Some(connection),
        }
    }
}

impl fmt::Debug for CallerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerContext")
            .field("provider", &self.provider)
            .field("project_id", &self.project_id)
            .field("connection", &self.connection.as_ref().map(|c| c.id()))
            .finish()
    }
}
