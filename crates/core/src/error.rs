// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity-level error taxonomy shared by every crate that mutates the
//! coordinator's in-memory state.

use thiserror::Error;

use crate::ids::{AgentId, JobId, TaskId};

/// Errors raised while mutating the entity model itself (agents, jobs, tasks).
///
/// These are distinct from `PlacementError` (placement-engine level) and
/// `ProtocolError` (wire level): a `CoreError` means an invariant on a single
/// entity would have been violated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("job {0} is already in a terminal state")]
    JobAlreadyTerminal(JobId),

    #[error("task {0} is already in a completed state")]
    TaskAlreadyCompleted(TaskId),

    #[error("agent {0} does not have enough available resources for this operation")]
    InsufficientResources(AgentId),

    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    #[error("unknown job: {0}")]
    UnknownJob(JobId),

    #[error("unknown task: {0}")]
    UnknownTask(TaskId),
}
