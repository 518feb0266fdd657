// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job entity: the submitted job definition plus its simple/grid execution state.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{AgentId, GridWorkerId, JobId, TaskId};
use crate::process_state::ProcessState;
use crate::resources::Resources;

/// Fields common to every job regardless of kind, set once at submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub job_id: JobId,
    /// Weight used for weighted-random selection in
    /// `on_agent_available_resources_changed`; higher bias toward this job.
    pub priority: f64,
    /// Spot instances with interruption probability above this percentage
    /// are excluded from the chooser's catalog for this job.
    pub interruption_probability_threshold: f64,
    pub resources_required: Resources,
}

/// A simple job's single worker slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleJobWorker {
    pub agent_id: AgentId,
    pub is_pending: bool,
}

/// State for a job with exactly one worker running one process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleJob {
    pub state: ProcessState,
    pub worker: Option<SimpleJobWorker>,
}

impl SimpleJob {
    pub fn new() -> Self {
        Self { state: ProcessState::RunRequested, worker: None }
    }

    /// Overwrites the process state, rejecting a transition out of a
    /// completed state (§9 Open Question 2: the source does not enforce
    /// this; this implementation does).
    pub fn set_state(&mut self, job_id: JobId, new: ProcessState) -> Result<(), CoreError> {
        if self.state.is_completed() {
            return Err(CoreError::JobAlreadyTerminal(job_id));
        }
        self.state = new;
        Ok(())
    }
}

impl Default for SimpleJob {
    fn default() -> Self {
        Self::new()
    }
}

/// One unit of work within a grid job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridTask {
    pub task_id: TaskId,
    pub pickled_arguments: Vec<u8>,
    pub state: ProcessState,
}

impl GridTask {
    pub fn new(task_id: TaskId, pickled_arguments: Vec<u8>) -> Self {
        Self { task_id, pickled_arguments, state: ProcessState::RunRequested }
    }

    /// Overwrites the task state; completed states are absorbing (§3 GridTask
    /// invariant and §8 property 5).
    pub fn set_state(&mut self, new: ProcessState) -> Result<(), CoreError> {
        if self.state.is_completed() {
            return Err(CoreError::TaskAlreadyCompleted(self.task_id));
        }
        self.state = new;
        Ok(())
    }
}

/// One child process dispatched by a grid job, identified independently of
/// any particular task since it runs a sequence of them over its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridWorker {
    pub grid_worker_id: GridWorkerId,
    pub agent_id: AgentId,
    pub current_task: Option<TaskId>,
    pub is_pending: bool,
}

impl GridWorker {
    pub fn new_pending(grid_worker_id: GridWorkerId, agent_id: AgentId) -> Self {
        Self { grid_worker_id, agent_id, current_task: None, is_pending: true }
    }

    /// `true` for PENDING and LAUNCHING (§3 GridWorker state machine): the
    /// worker is not currently bound to a task and so counts against
    /// `num_workers_needed`.
    pub fn is_unassigned(&self) -> bool {
        self.current_task.is_none()
    }
}

/// State for a job whose work is a backlog of independent tasks shared
/// across a pool of grid workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridJob {
    pub all_tasks: BTreeMap<TaskId, GridTask>,
    pub unassigned_tasks: VecDeque<TaskId>,
    /// Sealed once the producer signals no more tasks are coming.
    pub all_tasks_added: bool,
    pub workers: BTreeMap<GridWorkerId, GridWorker>,
}

impl GridJob {
    pub fn new() -> Self {
        Self {
            all_tasks: BTreeMap::new(),
            unassigned_tasks: VecDeque::new(),
            all_tasks_added: false,
            workers: BTreeMap::new(),
        }
    }

    /// Appends newly submitted tasks, each starting in `RUN_REQUESTED` and
    /// unassigned. `seal` marks `all_tasks_added` once the producer is done.
    pub fn add_tasks(&mut self, tasks: Vec<(TaskId, Vec<u8>)>, seal: bool) {
        for (task_id, pickled_arguments) in tasks {
            self.unassigned_tasks.push_back(task_id);
            self.all_tasks.insert(task_id, GridTask::new(task_id, pickled_arguments));
        }
        if seal {
            self.all_tasks_added = true;
        }
    }

    pub fn workers_without_task(&self) -> usize {
        self.workers.values().filter(|w| w.is_unassigned()).count()
    }

    /// §3 GridJob invariant: unassigned task count minus workers not yet
    /// bound to a task (pending or launching, counted once each).
    pub fn num_workers_needed(&self) -> usize {
        self.unassigned_tasks.len().saturating_sub(self.workers_without_task())
    }

    /// §4.2.3: binds the next unassigned task to `worker_id`, or `None` if
    /// the backlog is empty.
    pub fn assign_task_to_worker(&mut self, worker_id: GridWorkerId) -> Option<TaskId> {
        let task_id = self.unassigned_tasks.pop_front()?;
        if let Some(worker) = self.workers.get_mut(&worker_id) {
            worker.current_task = Some(task_id);
            worker.is_pending = false;
        }
        Some(task_id)
    }

    /// Pops one unassigned task (if any) and fails it with `state`. Used both
    /// by the fail-fast check and by worker-exit-before-any-task handling
    /// (§4.2.4, §7): makes an otherwise invisible startup failure surface as
    /// a visible task failure.
    pub fn fail_one_unassigned_task(&mut self, state: ProcessState) -> Option<TaskId> {
        let task_id = self.unassigned_tasks.pop_front()?;
        if let Some(task) = self.all_tasks.get_mut(&task_id) {
            // Already-completed tasks never reach unassigned_tasks, so this
            // cannot fail; ignore the (unreachable) error rather than panic.
            let _ = task.set_state(state);
        }
        Some(task_id)
    }
}

impl Default for GridJob {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobKind {
    Simple(SimpleJob),
    Grid(GridJob),
}

/// A job's submitted definition plus its execution state and any
/// job-specific agents the placement engine created for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub spec: JobSpec,
    pub kind: JobKind,
    pub job_specific_agents: Vec<AgentId>,
}

impl Job {
    pub fn new_simple(spec: JobSpec) -> Self {
        Self { spec, kind: JobKind::Simple(SimpleJob::new()), job_specific_agents: Vec::new() }
    }

    pub fn new_grid(spec: JobSpec) -> Self {
        Self { spec, kind: JobKind::Grid(GridJob::new()), job_specific_agents: Vec::new() }
    }

    pub fn job_id(&self) -> JobId {
        self.spec.job_id
    }

    pub fn priority(&self) -> f64 {
        self.spec.priority
    }

    pub fn resources_required(&self) -> &Resources {
        &self.spec.resources_required
    }

    pub fn interruption_probability_threshold(&self) -> f64 {
        self.spec.interruption_probability_threshold
    }

    /// §3 `num_workers_needed` invariant, dispatched by job kind.
    pub fn num_workers_needed(&self) -> usize {
        match &self.kind {
            JobKind::Simple(s) => {
                if s.worker.is_none() && !s.state.is_completed() {
                    1
                } else {
                    0
                }
            }
            JobKind::Grid(g) => g.num_workers_needed(),
        }
    }

    pub fn as_grid(&self) -> Option<&GridJob> {
        match &self.kind {
            JobKind::Grid(g) => Some(g),
            JobKind::Simple(_) => None,
        }
    }

    pub fn as_grid_mut(&mut self) -> Option<&mut GridJob> {
        match &mut self.kind {
            JobKind::Grid(g) => Some(g),
            JobKind::Simple(_) => None,
        }
    }

    pub fn as_simple(&self) -> Option<&SimpleJob> {
        match &self.kind {
            JobKind::Simple(s) => Some(s),
            JobKind::Grid(_) => None,
        }
    }

    pub fn as_simple_mut(&mut self) -> Option<&mut SimpleJob> {
        match &mut self.kind {
            JobKind::Simple(s) => Some(s),
            JobKind::Grid(_) => None,
        }
    }

    /// Fails the job outright (§4.2.1 fail-fast, §7 "insufficient resources,
    /// no agent can ever fit"). A simple job's single process state is set
    /// (rejected, not panicking, if already terminal). A grid job has no
    /// single top-level state, so every currently unassigned task is failed
    /// with `state` instead.
    pub fn fail(&mut self, state: ProcessState) {
        match &mut self.kind {
            JobKind::Simple(s) => {
                let _ = s.set_state(self.spec.job_id, state);
            }
            JobKind::Grid(g) => while g.fail_one_unassigned_task(state.clone()).is_some() {},
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
