// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Dispatcher Implementations
//!
//! `NullDispatcher` acknowledges everything without a runtime behind it,
//! for development wiring. `RecordingDispatcher` additionally captures the
//! calls it receives, in order, and can be armed to fail; tests use it to
//! assert routing behavior.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::domain::agent::AgentId;
use crate::domain::command::{AgentCommand, DispatcherAck};
use crate::domain::dispatcher::{DispatchError, RuntimeDispatcher};
use crate::domain::seraph::SeraphEvent;

pub struct NullDispatcher;

#[async_trait]
impl RuntimeDispatcher for NullDispatcher {
    async fn command(&self, command: &AgentCommand) -> Result<DispatcherAck, DispatchError> {
        debug!(command = %command.command, "null dispatcher acknowledging command");
        Ok(DispatcherAck::empty())
    }

    async fn message(
        &self,
        _agent_id: AgentId,
        _payload: &Value,
    ) -> Result<DispatcherAck, DispatchError> {
        Ok(DispatcherAck::empty())
    }

    async fn sync_state(&self, _agent_id: AgentId) -> Result<(), DispatchError> {
        Ok(())
    }

    async fn ping(&self, _agent_id: AgentId) -> Result<(), DispatchError> {
        Ok(())
    }

    async fn process_seraph_event(&self, _event: &SeraphEvent) -> Result<(), DispatchError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchCall {
    Command {
        agent_id: AgentId,
        command: String,
        data: Value,
    },
    Message {
        agent_id: AgentId,
        payload: Value,
    },
    SyncState {
        agent_id: AgentId,
    },
    Ping {
        agent_id: AgentId,
    },
    ProcessSeraphEvent {
        agent_id: AgentId,
    },
}

#[derive(Default)]
pub struct RecordingDispatcher {
    calls: Mutex<Vec<DispatchCall>>,
    response: Mutex<Value>,
    fail_next: Mutex<bool>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acknowledgement body returned by subsequent `command` calls.
    pub fn respond_with(&self, response: Value) {
        *self.response.lock() = response;
    }

    /// Fail the next dispatched call with an unreachable error.
    pub fn fail_next(&self) {
        *self.fail_next.lock() = true;
    }

    pub fn calls(&self) -> Vec<DispatchCall> {
        self.calls.lock().clone()
    }

    fn check_failure(&self) -> Result<(), DispatchError> {
        let mut armed = self.fail_next.lock();
        if *armed {
            *armed = false;
            return Err(DispatchError::Unreachable("injected outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RuntimeDispatcher for RecordingDispatcher {
    async fn command(&self, command: &AgentCommand) -> Result<DispatcherAck, DispatchError> {
        self.check_failure()?;
        let agent_id = command
            .agent_id
            .ok_or_else(|| DispatchError::Rejected("command without agent id".to_string()))?;
        self.calls.lock().push(DispatchCall::Command {
            agent_id,
            command: command.command.clone(),
            data: command.data.clone(),
        });
        Ok(DispatcherAck {
            response: self.response.lock().clone(),
        })
    }

    async fn message(
        &self,
        agent_id: AgentId,
        payload: &Value,
    ) -> Result<DispatcherAck, DispatchError> {
        self.check_failure()?;
        self.calls.lock().push(DispatchCall::Message {
            agent_id,
            payload: payload.clone(),
        });
        Ok(DispatcherAck::empty())
    }

    async fn sync_state(&self, agent_id: AgentId) -> Result<(), DispatchError> {
        self.check_failure()?;
        self.calls.lock().push(DispatchCall::SyncState { agent_id });
        Ok(())
    }

    async fn ping(&self, agent_id: AgentId) -> Result<(), DispatchError> {
        self.check_failure()?;
        self.calls.lock().push(DispatchCall::Ping { agent_id });
        Ok(())
    }

    async fn process_seraph_event(&self, event: &SeraphEvent) -> Result<(), DispatchError> {
        self.check_failure()?;
        self.calls.lock().push(DispatchCall::ProcessSeraphEvent {
            agent_id: event.agent_id,
        });
        Ok(())
    }
}
