// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from the agent-creator abstraction: catalog sourcing and launches.
#[derive(Debug, Error, Clone)]
pub enum AgentCreatorError {
    #[error("launch request rejected: {0}")]
    LaunchRejected(String),

    #[error("catalog source unavailable: {0}")]
    CatalogSourceUnavailable(String),

    #[error("timed out waiting for the first catalog refresh")]
    CatalogTimeout,

    #[error("local agent spawn failed: {0}")]
    SpawnFailed(String),
}
