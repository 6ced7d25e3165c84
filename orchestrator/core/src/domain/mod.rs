// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0

pub mod agent;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod release;
pub mod seraph;
pub mod spell;
pub mod store;
pub mod transport;

pub use agent::{Agent, AgentId, AgentPatch, AgentQuery, ProjectId};
pub use command::{AgentCommand, DispatcherAck, MessagePayload, RouterAck, TOGGLE_LIVE_COMMAND};
pub use dispatcher::{DispatchError, RuntimeDispatcher};
pub use error::{require, CoreError};
pub use release::{Release, ReleaseId};
pub use seraph::{SeraphEvent, SeraphEventId, SERAPH_EVENT_FETCH_LIMIT};
pub use spell::{Spell, SpellId};
pub use store::{
    AgentStore, PageRequest, ReleaseTx, SeraphEventStore, SpellPage, SpellQuery, SpellStore,
    StoreError, TransactionalStore,
};
pub use transport::{CallerContext, Connection, ConnectionId, Provider};
