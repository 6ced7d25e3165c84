// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Arcanum Orchestrator Core
//!
//! Orchestration layer for agents whose behavior is defined by a mutable
//! graph of executable spells. The core composes three concerns:
//!
//! - authorizing and routing commands/events to the correct live agent
//!   process via the runtime dispatcher,
//! - forking an agent's draft spell set into immutable, versioned releases
//!   as a single atomic store transaction,
//! - enforcing that at most one live connection occupies an agent's
//!   real-time channel, evicting the previous occupant.
//!
//! # Architecture
//!
//! - **`domain`** — entities, ids, ports (store, dispatcher, transport) and
//!   the error taxonomy.
//! - **`application`** — permission guard, release manager, command router,
//!   session channel registry, and the agent service façade.
//! - **`infrastructure`** — PostgreSQL and in-memory store implementations,
//!   connection pool, configuration.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
