// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator's in-memory entity graph (§3, §9 "cyclic references"):
//! agents and jobs are owned here by opaque ID; cross-references (an
//! agent's pending workers, a job's job-specific agents) are IDs resolved
//! back through these maps, never direct references.

use std::collections::HashMap;

use fleet_core::{Agent, AgentId, Job, JobId};

use crate::error::PlacementError;

/// All agents and jobs known to this coordinator. Mutated only from the
/// single-threaded event loop (§5); no internal locking.
#[derive(Debug, Default)]
pub struct CoordinatorState {
    pub agents: HashMap<AgentId, Agent>,
    pub jobs: HashMap<JobId, Job>,
}

impl CoordinatorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent(&self, agent_id: AgentId) -> Result<&Agent, PlacementError> {
        self.agents.get(&agent_id).ok_or(PlacementError::Core(fleet_core::CoreError::UnknownAgent(agent_id)))
    }

    pub fn agent_mut(&mut self, agent_id: AgentId) -> Result<&mut Agent, PlacementError> {
        self.agents
            .get_mut(&agent_id)
            .ok_or(PlacementError::Core(fleet_core::CoreError::UnknownAgent(agent_id)))
    }

    pub fn job(&self, job_id: JobId) -> Result<&Job, PlacementError> {
        self.jobs.get(&job_id).ok_or(PlacementError::Core(fleet_core::CoreError::UnknownJob(job_id)))
    }

    pub fn job_mut(&mut self, job_id: JobId) -> Result<&mut Job, PlacementError> {
        self.jobs.get_mut(&job_id).ok_or(PlacementError::Core(fleet_core::CoreError::UnknownJob(job_id)))
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
