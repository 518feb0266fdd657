// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lifecycle of a single worker process (simple job or grid task).

use serde::{Deserialize, Serialize};

/// State of a worker process, as reported by an agent or inferred by the coordinator.
///
/// The `*_COMPLETED` set (see [`ProcessState::is_completed`]) is absorbing: once a task
/// or simple job reaches one of these, it must never transition again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum ProcessState {
    RunRequested,
    Running,
    Succeeded(Option<String>),
    FailedWithResult(Option<String>),
    RunRequestFailed(String),
    ResourcesNotAvailable,
    ErrorGettingState(String),
    UnexpectedWorkerExit(String),
}

impl ProcessState {
    pub fn is_completed(&self) -> bool {
        !matches!(self, ProcessState::RunRequested | ProcessState::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessState::Succeeded(..))
    }
}

crate::simple_display! {
    ProcessState {
        RunRequested => "run_requested",
        Running => "running",
        Succeeded(..) => "succeeded",
        FailedWithResult(..) => "failed_with_result",
        RunRequestFailed(..) => "run_request_failed",
        ResourcesNotAvailable => "resources_not_available",
        ErrorGettingState(..) => "error_getting_state",
        UnexpectedWorkerExit(..) => "unexpected_worker_exit",
    }
}

#[cfg(test)]
#[path = "process_state_tests.rs"]
mod tests;
