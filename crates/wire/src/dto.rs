// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-level data-transfer objects carried inside [`crate::Request`] and
//! [`crate::Response`] variants (§6.1). These mirror the entity model in
//! `fleet-core` but are their own types: the wire surface should not break
//! every time an internal field is renamed.

use serde::{Deserialize, Serialize};

use fleet_core::{AgentId, GridWorkerId, JobId, ProcessState, Resources, TaskId};

/// A job definition as submitted via `add_job` (§6.1).
///
/// `job_id` is chosen by the submitter, not the coordinator (mirroring how
/// `GridTaskInput::task_id` is caller-supplied): the submitter needs the id
/// up front to make follow-up calls (`add_tasks_to_grid_job`, state queries)
/// without waiting on a round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobDefinition {
    pub job_id: JobId,
    pub priority: f64,
    pub interruption_probability_threshold: f64,
    pub resources_required: Resources,
    pub kind: JobDefinitionKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum JobDefinitionKind {
    Simple,
    /// A grid job may be submitted with its first batch of tasks already
    /// attached, sealed or not (§3 `all_tasks_added`).
    Grid {
        #[serde(default)]
        initial_tasks: Vec<GridTaskInput>,
        #[serde(default)]
        all_tasks_added: bool,
    },
}

/// One task as submitted to a grid job, either at creation or via
/// `add_tasks_to_grid_job`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridTaskInput {
    pub task_id: TaskId,
    pub pickled_arguments: Vec<u8>,
}

/// Snapshot of one agent, returned by `get_agent_states` (§6.1, debug/query).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSnapshot {
    pub agent_id: AgentId,
    pub kind: AgentKindSnapshot,
    pub total_resources: Resources,
    pub available_resources: Resources,
    pub pending_worker_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum AgentKindSnapshot {
    Generic,
    JobSpecific { job_id: JobId, has_registered: bool },
}

/// Filter for `get_agent_states`; `None` means "all agents".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

/// Filter for `get_grid_task_states`; `None` means "all tasks in the job".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GridTaskFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_ids: Option<Vec<TaskId>>,
}

/// One entry drained from an agent's pending-worker queue (§4.3).
///
/// `grid_worker_id` is present for grid jobs (freshly minted at the dispatch
/// decision) and absent for simple jobs, which have exactly one worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchRecord {
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_worker_id: Option<GridWorkerId>,
}

/// Acknowledgement returned from `register_agent` (§4.3): idempotent, so the
/// caller cannot distinguish a fresh registration from a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrationRecord {
    pub agent_id: AgentId,
}

/// One state update reported by an agent via `update_job_states` (§4.2.4).
///
/// `worker_id` is present for grid jobs (identifies which `GridWorker`
/// reported) and absent for simple jobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobStateUpdate {
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<GridWorkerId>,
    pub state: ProcessState,
}

/// Credential payload for `add_credentials`; contents are out of scope (§1),
/// this is a pass-through record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialRecord {
    pub name: String,
    pub payload: String,
}

/// Result of `update_grid_task_state_and_get_next` (§6.1): either the next
/// task to run, or an explicit "no more work" signal so the agent can
/// distinguish "nothing right now" from a protocol error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum NextTask {
    Task { task_id: TaskId, pickled_arguments: Vec<u8> },
    NoMoreWork,
}

#[cfg(test)]
#[path = "dto_tests.rs"]
mod tests;
