// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use fleet_core::ProcessState;

use crate::dto::{AgentSnapshot, DispatchRecord, NextTask, RegistrationRecord};

/// Response from the coordinator back to an agent or operator tool (§6.1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic acknowledgement (`add_job`, `add_tasks_to_grid_job`,
    /// `add_credentials`, `update_job_states`).
    Ok,

    /// Health check response (`Check`).
    Pong,

    /// `get_simple_job_states` result, in request order.
    SimpleJobStates { states: Vec<ProcessState> },

    /// `get_grid_task_states` result.
    GridTaskStates { states: Vec<(fleet_core::TaskId, ProcessState)> },

    /// `get_agent_states` result.
    AgentStates { agents: Vec<AgentSnapshot> },

    /// `register_agent` result.
    Registered { record: RegistrationRecord },

    /// `get_next_jobs` result: the agent's drained pending-worker queue.
    NextJobs { dispatch: Vec<DispatchRecord> },

    /// `update_grid_task_state_and_get_next` result.
    NextTask { next: NextTask },

    /// Request-level protocol violation (unknown agent, duplicate task, ...):
    /// no coordinator state changes (§7).
    Error { message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
