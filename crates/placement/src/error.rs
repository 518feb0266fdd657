// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use fleet_agents::AgentCreatorError;
use fleet_core::{CoreError, GridWorkerId};

/// Errors from the placement engine: either an entity-level invariant
/// violation (§3) or a request-level protocol violation that the source
/// treats as a caller error with no coordinator state change (§7).
#[derive(Debug, Error, Clone)]
pub enum PlacementError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("unknown grid worker: {0}")]
    UnknownWorker(GridWorkerId),

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("agent provisioning failed: {0}")]
    AgentCreator(#[from] AgentCreatorError),

    /// Phase B (§4.2.1 step 3) launched a batch of agents and one or more of
    /// the launch calls failed; the corresponding reservations were rolled
    /// back but any agents launched successfully in the same batch are kept.
    #[error("{} of a provisioning batch's agent launch(es) failed", .0.len())]
    LaunchBatchFailed(Vec<AgentCreatorError>),
}
