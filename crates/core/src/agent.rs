// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent entity: a registered worker machine, generic or dedicated to one job.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{AgentId, GridWorkerId, JobId};
use crate::resources::Resources;

/// Which jobs an agent may host.
///
/// A `Generic` agent accepts workers from any job; a `JobSpecific` agent is
/// provisioned for exactly one job and is pre-registered by the coordinator
/// before the agent process ever contacts it (`has_registered` tracks that).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentKind {
    Generic,
    JobSpecific { job_id: JobId, has_registered: bool },
}

/// A scheduling decision the coordinator has made but not yet handed to the
/// agent: materialises into a running worker on the agent's next poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingWorker {
    pub job_id: JobId,
    /// `Some` for grid jobs (identifies the `GridWorker`); `None` for simple jobs,
    /// which have at most one worker per job and need no separate worker id.
    pub grid_worker_id: Option<GridWorkerId>,
}

/// A registered agent: its immutable capacity, its currently free capacity,
/// and the scheduling decisions not yet drained by a poll.
///
/// Invariant: `available_resources` plus the resources reserved for every
/// worker currently owned by this agent (pending or running) equals
/// `total_resources`. Every mutator below maintains this invariant; there is
/// no path that debits or credits `available_resources` outside this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: AgentId,
    pub kind: AgentKind,
    pub total_resources: Resources,
    pub available_resources: Resources,
    pub pending_workers: Vec<PendingWorker>,
    /// Epoch millis of the last time this agent was heard from (registration
    /// or a `get_next_jobs` poll). Used by the liveness reaper (§9 Open
    /// Question 1: the source has no `agent_died_prematurely` detection; this
    /// implementation adds a heartbeat timeout on top of it).
    pub last_seen_epoch_ms: u64,
}

impl Agent {
    pub fn new_generic(agent_id: AgentId, total_resources: Resources) -> Self {
        Self {
            agent_id,
            kind: AgentKind::Generic,
            available_resources: total_resources.clone(),
            total_resources,
            pending_workers: Vec::new(),
            last_seen_epoch_ms: 0,
        }
    }

    pub fn new_job_specific(agent_id: AgentId, job_id: JobId, total_resources: Resources) -> Self {
        Self {
            agent_id,
            kind: AgentKind::JobSpecific { job_id, has_registered: false },
            available_resources: total_resources.clone(),
            total_resources,
            pending_workers: Vec::new(),
            last_seen_epoch_ms: 0,
        }
    }

    /// Records a heartbeat (registration or poll) at `now_epoch_ms`.
    pub fn touch(&mut self, now_epoch_ms: u64) {
        self.last_seen_epoch_ms = now_epoch_ms;
    }

    /// `true` if this agent has not been heard from within `timeout_ms`.
    pub fn is_dead(&self, now_epoch_ms: u64, timeout_ms: u64) -> bool {
        now_epoch_ms.saturating_sub(self.last_seen_epoch_ms) > timeout_ms
    }

    pub fn is_generic(&self) -> bool {
        matches!(self.kind, AgentKind::Generic)
    }

    pub fn job_id(&self) -> Option<JobId> {
        match self.kind {
            AgentKind::Generic => None,
            AgentKind::JobSpecific { job_id, .. } => Some(job_id),
        }
    }

    /// `true` unless this is a pre-registered job-specific agent that the
    /// physical agent process has not yet contacted.
    pub fn has_registered(&self) -> bool {
        match self.kind {
            AgentKind::Generic => true,
            AgentKind::JobSpecific { has_registered, .. } => has_registered,
        }
    }

    /// Marks a job-specific agent as having completed its first contact.
    /// A no-op (idempotent) on a `Generic` agent or an already-registered one.
    pub fn mark_registered(&mut self) {
        if let AgentKind::JobSpecific { has_registered, .. } = &mut self.kind {
            *has_registered = true;
        }
    }

    /// Whether this agent, with its full (not just available) capacity,
    /// could ever host `demand`. Used by the fail-fast check: a job that no
    /// agent can *ever* fit, even empty, is hopeless.
    pub fn can_ever_fit(&self, demand: &Resources) -> bool {
        self.total_resources.can_ever_fit(demand)
    }

    /// Reserves `demand` against this agent's available capacity, queuing a
    /// pending worker. Fails if the agent does not currently have enough
    /// free capacity; the caller is expected to have already checked fit.
    pub fn reserve_worker(
        &mut self,
        demand: &Resources,
        job_id: JobId,
        grid_worker_id: Option<GridWorkerId>,
    ) -> Result<(), CoreError> {
        let remaining = self
            .available_resources
            .subtract(demand)
            .ok_or_else(|| CoreError::InsufficientResources(self.agent_id))?;
        self.available_resources = remaining;
        self.pending_workers.push(PendingWorker { job_id, grid_worker_id });
        Ok(())
    }

    /// Releases `resources` back into this agent's available pool (a worker
    /// completed or was never realised after a pre-debit).
    pub fn release(&mut self, resources: &Resources) {
        self.available_resources = self.available_resources.add(resources);
    }

    /// Drains and returns every pending worker for this agent's next poll.
    /// A second call with no intervening scheduling returns an empty vec.
    pub fn drain_pending_workers(&mut self) -> Vec<PendingWorker> {
        std::mem::take(&mut self.pending_workers)
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
