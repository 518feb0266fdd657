// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The placement engine (§4.2): given the coordinator's entity graph plus an
//! event, mutate the graph by creating pending workers and, if needed,
//! provisioning new agents. Each entry point here corresponds to one of the
//! spec's three: `on_job_workers_needed_changed`, `on_agent_available_resources_changed`,
//! and the grid state-update handlers (§4.2.4) plus the pull-based dispatch
//! protocol (§4.3).
//!
//! Pure(-ish) functions that take the current state and an event and produce
//! mutations, kept separate from the listener that drives them.

use std::collections::HashSet;

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use tracing::{info, warn};

use fleet_agents::AgentCreator;
use fleet_core::{
    Agent, AgentId, GridWorker, GridWorkerId, JobId, JobKind, ProcessState, Resources,
    SimpleJobWorker, TaskId,
};

use crate::chooser::{choose_instances, ChooserTolerances};
use crate::error::PlacementError;
use crate::state::CoordinatorState;

/// Tunables beyond the chooser's own (§4.1 tolerances): how long an agent
/// may go unheard-from before the reaper considers it dead (§9 Open Question
/// 1 — the source has no `agent_died_prematurely` detection).
#[derive(Debug, Clone, Copy)]
pub struct PlacementConfig {
    pub tolerances: ChooserTolerances,
    pub agent_dead_timeout_ms: u64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self { tolerances: ChooserTolerances::default(), agent_dead_timeout_ms: 5 * 60 * 1000 }
    }
}

/// §4.2.1 Phase A fit score: `(indicator, sort_key)`. Agents that currently
/// fit (`indicator = 0`) sort before ones that don't; among those that fit,
/// the tightest fit (least leftover capacity) wins, to pack greedily.
fn fit_key(agent: &Agent, demand: &Resources) -> Option<(f64, f64)> {
    let remainder = agent.available_resources.subtract(demand)?;
    let custom_remainder: f64 = remainder.custom.values().sum();
    Some((custom_remainder, remainder.memory_gb + 2.0 * remainder.logical_cpu as f64))
}

/// Reserves one worker for `job_id` on `agent_id`: debits the agent, mints a
/// grid-worker id if the job is a grid job, and records the new worker on
/// the job side.
fn create_worker_on_agent(
    state: &mut CoordinatorState,
    agent_id: AgentId,
    job_id: JobId,
) -> Result<(), PlacementError> {
    let demand = state.job(job_id)?.resources_required().clone();
    let is_grid = state.job(job_id)?.as_grid().is_some();
    let grid_worker_id = is_grid.then(GridWorkerId::new);

    state.agent_mut(agent_id)?.reserve_worker(&demand, job_id, grid_worker_id)?;

    let job = state.job_mut(job_id)?;
    match &mut job.kind {
        JobKind::Simple(simple) => {
            simple.worker = Some(SimpleJobWorker { agent_id, is_pending: true });
        }
        JobKind::Grid(grid) => {
            #[allow(clippy::expect_used)]
            let grid_worker_id = grid_worker_id.expect("grid job mints a worker id above");
            grid.workers.insert(grid_worker_id, GridWorker::new_pending(grid_worker_id, agent_id));
        }
    }
    Ok(())
}

/// Undoes a job-specific agent that the coordinator created in anticipation
/// of a launch that then failed: removes the agent record and any worker
/// slot it was given, so `num_workers_needed` reflects reality again for the
/// next placement cycle. Not specified by the source; see DESIGN.md.
fn roll_back_agent(state: &mut CoordinatorState, agent_id: AgentId) {
    let Some(agent) = state.agents.remove(&agent_id) else { return };
    let Some(job_id) = agent.job_id() else { return };
    let Ok(job) = state.job_mut(job_id) else { return };
    job.job_specific_agents.retain(|id| *id != agent_id);
    match &mut job.kind {
        JobKind::Simple(simple) => {
            if matches!(&simple.worker, Some(w) if w.agent_id == agent_id) {
                simple.worker = None;
            }
        }
        JobKind::Grid(grid) => {
            grid.workers.retain(|_, w| w.agent_id != agent_id);
        }
    }
}

/// §4.2.1: invoked whenever `job.num_workers_needed()` increases.
pub async fn on_job_workers_needed_changed(
    state: &mut CoordinatorState,
    job_id: JobId,
    creator: Option<&dyn AgentCreator>,
    config: &PlacementConfig,
) -> Result<usize, PlacementError> {
    let mut n = state.job(job_id)?.num_workers_needed();
    if n == 0 {
        return Ok(0);
    }
    let demand = state.job(job_id)?.resources_required().clone();
    let mut created = 0usize;

    // Phase A: fit on existing generic agents.
    loop {
        if n == 0 {
            break;
        }
        let best = state
            .agents
            .values()
            .filter(|a| a.is_generic())
            .filter_map(|a| fit_key(a, &demand).map(|key| (a.agent_id, key)))
            .fold(None, |acc: Option<(AgentId, (f64, f64))>, (id, key)| match acc {
                Some((_, best_key)) if best_key <= key => acc,
                _ => Some((id, key)),
            });
        let Some((agent_id, _)) = best else { break };
        create_worker_on_agent(state, agent_id, job_id)?;
        created += 1;
        n -= 1;
    }

    // Phase B: provision new agents, unless the job needs custom resources
    // (§4.2.1 step 3 — we have no way to match those to instance types).
    // `wait_for_instance_types` can block for several minutes on a cold
    // catalog; this runs under the caller's coordinator-wide lock like every
    // other mutation here, so a job that lands during that window holds up
    // other requests too rather than failing fast against an empty catalog.
    let mut plan_nonempty = false;
    if n > 0 && demand.custom.is_empty() {
        if let Some(creator) = creator {
            if let Some(catalog) = creator.wait_for_instance_types().await {
                let threshold = state.job(job_id)?.interruption_probability_threshold();
                let plan = choose_instances(&demand, n as u32, threshold, &catalog, &config.tolerances);
                plan_nonempty = !plan.is_empty();

                let mut remaining = n;
                let mut launches = Vec::new();
                for planned in &plan {
                    for _ in 0..planned.num_instances {
                        if remaining == 0 {
                            break;
                        }
                        let take = (planned.workers_per_instance as usize).min(remaining);
                        let agent_id = AgentId::new();
                        let agent_total = Resources::new(
                            demand.memory_gb * planned.workers_per_instance as f64,
                            demand.logical_cpu * planned.workers_per_instance,
                        );
                        state.agents.insert(agent_id, Agent::new_job_specific(agent_id, job_id, agent_total));
                        state.job_mut(job_id)?.job_specific_agents.push(agent_id);

                        for _ in 0..take {
                            create_worker_on_agent(state, agent_id, job_id)?;
                        }
                        remaining -= take;

                        launches.push(async move {
                            let result = creator
                                .launch_job_specific_agent(
                                    agent_id,
                                    job_id,
                                    &planned.instance_type,
                                    planned.on_demand_or_spot,
                                )
                                .await;
                            (agent_id, take, result)
                        });
                    }
                }

                let results = futures_util::future::join_all(launches).await;
                let mut errors = Vec::new();
                for (agent_id, take, result) in results {
                    match result {
                        Ok(()) => created += take,
                        Err(err) => {
                            warn!(%agent_id, %job_id, error = %err, "agent launch failed, rolling back reservation");
                            roll_back_agent(state, agent_id);
                            errors.push(err);
                        }
                    }
                }
                if !errors.is_empty() {
                    info!(%job_id, failed = errors.len(), "some provisioning launches failed; already-launched instances kept");
                    return Err(PlacementError::LaunchBatchFailed(errors));
                }
            }
        }
    }

    // Fail-fast: nothing was placed, no generic agent could ever host this
    // job even empty, and provisioning could not help either.
    if created == 0 {
        let any_generic_can_fit = state.agents.values().any(|a| a.is_generic() && a.can_ever_fit(&demand));
        if !any_generic_can_fit && !plan_nonempty {
            warn!(%job_id, "no agent can ever satisfy this job's resource demand");
            state.job_mut(job_id)?.fail(ProcessState::ResourcesNotAvailable);
        }
    }

    Ok(created)
}

/// §4.2.2: invoked when an agent registers or a worker completes. Repeatedly
/// weighted-randomly assigns one fitting job's worker to the agent until no
/// eligible job remains.
pub fn on_agent_available_resources_changed(
    state: &mut CoordinatorState,
    agent_id: AgentId,
    rng: &mut impl Rng,
) -> Result<usize, PlacementError> {
    let mut placed = 0usize;
    loop {
        let available = state.agent(agent_id)?.available_resources.clone();
        let candidates: Vec<(JobId, f64)> = state
            .jobs
            .values()
            .filter(|job| job.num_workers_needed() > 0)
            .filter(|job| available.subtract(job.resources_required()).is_some())
            .map(|job| (job.job_id(), job.priority().max(0.0)))
            .collect();
        if candidates.is_empty() {
            break;
        }

        let chosen = if candidates.iter().all(|(_, weight)| *weight <= 0.0) {
            candidates[rng.gen_range(0..candidates.len())].0
        } else {
            let weights: Vec<f64> = candidates.iter().map(|(_, weight)| *weight).collect();
            let dist = WeightedIndex::new(&weights)
                .map_err(|e| PlacementError::ProtocolViolation(e.to_string()))?;
            candidates[dist.sample(rng)].0
        };

        create_worker_on_agent(state, agent_id, chosen)?;
        placed += 1;
    }
    Ok(placed)
}

/// §4.3 `register_agent`: creates a `Generic` agent on first contact, or
/// marks a pre-registered `JobSpecific` agent as having registered.
/// Duplicate registrations are idempotent. Returns `true` if the caller
/// should follow up with `on_agent_available_resources_changed` (every path
/// here does; the bool exists for the handler's own logging).
pub fn register_agent(
    state: &mut CoordinatorState,
    agent_id: AgentId,
    total_resources: Resources,
    job_id: Option<JobId>,
    now_epoch_ms: u64,
) -> Result<bool, PlacementError> {
    match job_id {
        Some(_) => {
            let agent = state.agent_mut(agent_id)?;
            agent.mark_registered();
            agent.touch(now_epoch_ms);
            Ok(true)
        }
        None => {
            if let Some(agent) = state.agents.get_mut(&agent_id) {
                agent.touch(now_epoch_ms);
                return Ok(true);
            }
            let mut agent = Agent::new_generic(agent_id, total_resources);
            agent.touch(now_epoch_ms);
            state.agents.insert(agent_id, agent);
            Ok(true)
        }
    }
}

/// §4.3 `get_next_jobs`: drains the agent's pending-worker queue, flipping
/// each drained worker from PENDING to LAUNCHING. A second call with no
/// intervening scheduling returns an empty list (§8 property 6).
pub fn get_next_jobs(
    state: &mut CoordinatorState,
    agent_id: AgentId,
    now_epoch_ms: u64,
) -> Result<Vec<fleet_core::PendingWorker>, PlacementError> {
    let agent = state.agent_mut(agent_id)?;
    agent.touch(now_epoch_ms);
    let drained = agent.drain_pending_workers();

    for pending in &drained {
        let Ok(job) = state.job_mut(pending.job_id) else { continue };
        match (&mut job.kind, pending.grid_worker_id) {
            (JobKind::Grid(grid), Some(worker_id)) => {
                if let Some(worker) = grid.workers.get_mut(&worker_id) {
                    worker.is_pending = false;
                }
            }
            (JobKind::Simple(simple), None) => {
                if let Some(worker) = &mut simple.worker {
                    worker.is_pending = false;
                }
            }
            _ => {}
        }
    }
    Ok(drained)
}

/// §4.2.4 `update_simple_job_state`: overwrites the job's process state
/// (rejecting a regression out of a terminal state, §9 Open Question 2) and
/// credits the agent on completion. Returns the agent to re-drive
/// `on_agent_available_resources_changed` on.
pub fn update_simple_job_state(
    state: &mut CoordinatorState,
    job_id: JobId,
    reported: ProcessState,
) -> Result<AgentId, PlacementError> {
    let demand = state.job(job_id)?.resources_required().clone();
    let job = state.job_mut(job_id)?;
    let simple = job
        .as_simple_mut()
        .ok_or_else(|| PlacementError::ProtocolViolation("job is not a simple job".into()))?;
    let agent_id = simple
        .worker
        .as_ref()
        .map(|w| w.agent_id)
        .ok_or_else(|| PlacementError::ProtocolViolation("simple job has no worker yet".into()))?;

    let completed = reported.is_completed();
    simple.set_state(job_id, reported)?;

    if completed {
        state.agent_mut(agent_id)?.release(&demand);
    }
    Ok(agent_id)
}

/// §4.2.4 `update_grid_job_state`: reports a grid *worker's* terminal state
/// (the agent's process for that worker exited). `RUNNING` is a no-op (the
/// source elides the RUNNING/TASK_ACQUIRED race). On non-success, propagates
/// the failure to the worker's current task, or — if it had none — to one
/// unassigned task, so startup failures surface as visible task failures
/// (§7). Always credits the agent's resources back. Returns the agent id.
pub fn update_grid_job_state(
    state: &mut CoordinatorState,
    job_id: JobId,
    worker_id: GridWorkerId,
    reported: ProcessState,
) -> Result<AgentId, PlacementError> {
    if reported == ProcessState::Running {
        let job = state.job_mut(job_id)?;
        let grid = job
            .as_grid_mut()
            .ok_or_else(|| PlacementError::ProtocolViolation("job is not a grid job".into()))?;
        let worker = grid.workers.get(&worker_id).ok_or(PlacementError::UnknownWorker(worker_id))?;
        return Ok(worker.agent_id);
    }
    if !reported.is_completed() {
        return Err(PlacementError::ProtocolViolation(format!(
            "unexpected grid worker state report: {reported}"
        )));
    }

    let demand = state.job(job_id)?.resources_required().clone();
    let job = state.job_mut(job_id)?;
    let grid = job
        .as_grid_mut()
        .ok_or_else(|| PlacementError::ProtocolViolation("job is not a grid job".into()))?;
    let worker = grid.workers.get(&worker_id).ok_or(PlacementError::UnknownWorker(worker_id))?;
    let agent_id = worker.agent_id;
    let current_task = worker.current_task;

    if !reported.is_success() {
        match current_task {
            Some(task_id) => {
                if let Some(task) = grid.all_tasks.get_mut(&task_id) {
                    if !task.state.is_completed() {
                        let _ = task.set_state(reported.clone());
                    }
                }
            }
            None => {
                grid.fail_one_unassigned_task(reported.clone());
            }
        }
    }
    grid.workers.remove(&worker_id);

    state.agent_mut(agent_id)?.release(&demand);
    Ok(agent_id)
}

/// `update_grid_task_state_and_get_next`: records a completed task (if any)
/// still live at the wire call, then hands the worker the next unassigned
/// task. A completed task is final — a duplicate/late report against one is
/// ignored rather than erroring (§9 Open Question 4).
pub fn update_grid_task_state_and_get_next(
    state: &mut CoordinatorState,
    job_id: JobId,
    worker_id: GridWorkerId,
    completed: Option<(TaskId, ProcessState)>,
) -> Result<Option<(TaskId, Vec<u8>)>, PlacementError> {
    let job = state.job_mut(job_id)?;
    let grid = job
        .as_grid_mut()
        .ok_or_else(|| PlacementError::ProtocolViolation("job is not a grid job".into()))?;
    if !grid.workers.contains_key(&worker_id) {
        return Err(PlacementError::UnknownWorker(worker_id));
    }

    if let Some((task_id, new_state)) = completed {
        let task = grid
            .all_tasks
            .get_mut(&task_id)
            .ok_or_else(|| PlacementError::ProtocolViolation(format!("unknown task {task_id}")))?;
        if !task.state.is_completed() {
            task.set_state(new_state)?;
        }
    }

    Ok(grid.assign_task_to_worker(worker_id).map(|task_id| {
        let args = grid.all_tasks[&task_id].pickled_arguments.clone();
        (task_id, args)
    }))
}

/// §9 Open Question 1: heartbeat-timeout liveness check. Removes every agent
/// not heard from (registration or `get_next_jobs`) within
/// `config.agent_dead_timeout_ms`, frees the worker slots it held, fails any
/// in-flight grid task it was running with `UNEXPECTED_WORKER_EXIT`, and
/// returns the set of jobs that need a fresh `on_job_workers_needed_changed`
/// pass to replace the lost capacity.
pub fn reap_dead_agents(
    state: &mut CoordinatorState,
    now_epoch_ms: u64,
    config: &PlacementConfig,
) -> Vec<JobId> {
    let dead: Vec<AgentId> = state
        .agents
        .values()
        .filter(|agent| agent.has_registered() && agent.is_dead(now_epoch_ms, config.agent_dead_timeout_ms))
        .map(|agent| agent.agent_id)
        .collect();

    let mut affected = HashSet::new();
    for agent_id in dead {
        let Some(agent) = state.agents.remove(&agent_id) else { continue };
        if let Some(job_id) = agent.job_id() {
            affected.insert(job_id);
        }
        warn!(%agent_id, "agent declared dead (heartbeat timeout), reaping its workers");

        for job in state.jobs.values_mut() {
            match &mut job.kind {
                JobKind::Simple(simple) => {
                    if matches!(&simple.worker, Some(w) if w.agent_id == agent_id) {
                        simple.worker = None;
                        affected.insert(job.spec.job_id);
                    }
                }
                JobKind::Grid(grid) => {
                    let lost: Vec<GridWorkerId> =
                        grid.workers.values().filter(|w| w.agent_id == agent_id).map(|w| w.grid_worker_id).collect();
                    if !lost.is_empty() {
                        affected.insert(job.spec.job_id);
                    }
                    for worker_id in lost {
                        if let Some(worker) = grid.workers.remove(&worker_id) {
                            if let Some(task_id) = worker.current_task {
                                if let Some(task) = grid.all_tasks.get_mut(&task_id) {
                                    if !task.state.is_completed() {
                                        let _ = task.set_state(ProcessState::UnexpectedWorkerExit(
                                            "agent heartbeat timeout".to_string(),
                                        ));
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    affected.into_iter().collect()
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
