// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0

pub mod channels;
pub mod permission;
pub mod release;
pub mod router;
pub mod service;

pub use channels::{SessionChannelRegistry, SubscribeOutcome};
pub use permission::PermissionGuard;
pub use release::{CreateRelease, ReleaseManager};
pub use router::CommandRouter;
pub use service::{AgentService, CreateAgent};
