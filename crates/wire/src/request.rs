// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use fleet_core::{AgentId, JobId, Resources};

use crate::dto::{
    AgentFilter, CredentialRecord, GridTaskFilter, JobDefinition, JobStateUpdate, GridTaskInput,
};

/// Request from an agent or operator tool to the coordinator (§6.1).
///
/// Method names are part of the compatibility surface with existing agents;
/// `#[serde(tag = "method")]` is preserved bit-exactly across releases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method")]
pub enum Request {
    AddJob { job: JobDefinition },

    AddTasksToGridJob {
        job_id: JobId,
        tasks: Vec<GridTaskInput>,
        #[serde(default)]
        all_tasks_added: bool,
    },

    GetSimpleJobStates { job_ids: Vec<JobId> },

    GetGridTaskStates {
        job_id: JobId,
        #[serde(default)]
        filter: GridTaskFilter,
    },

    AddCredentials { credential: CredentialRecord },

    GetAgentStates {
        #[serde(default)]
        filter: AgentFilter,
    },

    RegisterAgent {
        agent_id: AgentId,
        total_resources: Resources,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_id: Option<JobId>,
    },

    GetNextJobs { agent_id: AgentId },

    UpdateJobStates { updates: Vec<JobStateUpdate> },

    UpdateGridTaskStateAndGetNext {
        job_id: JobId,
        worker_id: fleet_core::GridWorkerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completed_task_id: Option<fleet_core::TaskId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completed_state: Option<fleet_core::ProcessState>,
    },

    Check,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
