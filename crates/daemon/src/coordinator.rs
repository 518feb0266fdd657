// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator: wires the in-memory entity graph (`fleet_placement`)
//! to the wire protocol (`fleet_wire`) — one `handle_request` per RPC
//! method, state mutated behind a single async mutex standing in for the
//! source's cooperative event loop (§5).

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use fleet_agents::AgentCreator;
use fleet_core::{Clock, Job, JobId, JobSpec, ProcessState, Resources, SystemClock};
use fleet_placement::{
    get_next_jobs, on_agent_available_resources_changed, on_job_workers_needed_changed,
    reap_dead_agents, register_agent, update_grid_job_state, update_grid_task_state_and_get_next,
    update_simple_job_state, CoordinatorState, PlacementConfig,
};
use fleet_wire::{
    AgentFilter, AgentKindSnapshot, AgentSnapshot, DispatchRecord, GridTaskInput, JobDefinitionKind,
    NextTask, RegistrationRecord, Request, Response,
};

/// The coordinator's handle: entity graph, placement config, and the
/// capability used to provision new agents (§4.4). Generic over the clock
/// so tests can drive liveness deterministically with `FakeClock`.
pub struct Coordinator<C: Clock = SystemClock> {
    state: Mutex<CoordinatorState>,
    creator: Option<Arc<dyn AgentCreator>>,
    config: PlacementConfig,
    clock: C,
}

impl Coordinator<SystemClock> {
    pub fn new(creator: Option<Arc<dyn AgentCreator>>, config: PlacementConfig) -> Self {
        Self::with_clock(creator, config, SystemClock)
    }
}

impl<C: Clock> Coordinator<C> {
    pub fn with_clock(creator: Option<Arc<dyn AgentCreator>>, config: PlacementConfig, clock: C) -> Self {
        Self { state: Mutex::new(CoordinatorState::new()), creator, config, clock }
    }

    /// Releases the agent-creator's own background tasks (catalog refresh,
    /// spawned child processes) on shutdown.
    pub async fn close(&self) {
        if let Some(creator) = &self.creator {
            creator.close().await;
        }
    }

    /// §9 Open Question 1: sweeps agents that have not polled within the
    /// configured timeout, then re-places any workers they were carrying.
    pub async fn reap_dead_agents(&self) {
        let now = self.clock.epoch_ms();
        let affected = {
            let mut state = self.state.lock().await;
            reap_dead_agents(&mut state, now, &self.config)
        };
        for job_id in affected {
            self.replace_lost_workers(job_id).await;
        }
    }

    async fn replace_lost_workers(&self, job_id: JobId) {
        let mut state = self.state.lock().await;
        if !state.jobs.contains_key(&job_id) {
            return;
        }
        if let Err(err) =
            on_job_workers_needed_changed(&mut state, job_id, self.creator.as_deref(), &self.config).await
        {
            warn!(%job_id, %err, "failed to re-place workers after reaping a dead agent");
        }
    }

    /// Dispatches one RPC request to its handler (§6.1). Never panics: every
    /// failure mode becomes a `Response::Error` with no partial state change
    /// beyond what the handler itself already committed (§7).
    pub async fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::AddJob { job } => self.add_job(job).await,
            Request::AddTasksToGridJob { job_id, tasks, all_tasks_added } => {
                self.add_tasks_to_grid_job(job_id, tasks, all_tasks_added).await
            }
            Request::GetSimpleJobStates { job_ids } => self.get_simple_job_states(job_ids).await,
            Request::GetGridTaskStates { job_id, filter } => self.get_grid_task_states(job_id, filter).await,
            Request::AddCredentials { credential } => {
                debug!(name = %credential.name, "accepted credential (out of scope, discarded)");
                Response::Ok
            }
            Request::GetAgentStates { filter } => self.get_agent_states(filter).await,
            Request::RegisterAgent { agent_id, total_resources, job_id } => {
                self.register_agent(agent_id, total_resources, job_id).await
            }
            Request::GetNextJobs { agent_id } => self.get_next_jobs(agent_id).await,
            Request::UpdateJobStates { updates } => self.update_job_states(updates).await,
            Request::UpdateGridTaskStateAndGetNext { job_id, worker_id, completed_task_id, completed_state } => {
                self.update_grid_task_state_and_get_next(job_id, worker_id, completed_task_id, completed_state)
                    .await
            }
            Request::Check => Response::Pong,
        }
    }

    async fn add_job(&self, job: fleet_wire::JobDefinition) -> Response {
        let job_id = job.job_id;
        let mut state = self.state.lock().await;
        if state.jobs.contains_key(&job_id) {
            return Response::Error { message: format!("job {job_id} already exists") };
        }

        let spec = JobSpec {
            job_id,
            priority: job.priority,
            interruption_probability_threshold: job.interruption_probability_threshold,
            resources_required: job.resources_required,
        };
        let entity = match job.kind {
            JobDefinitionKind::Simple => Job::new_simple(spec),
            JobDefinitionKind::Grid { initial_tasks, all_tasks_added } => {
                let mut entity = Job::new_grid(spec);
                if let Some(grid) = entity.as_grid_mut() {
                    grid.add_tasks(tasks_from_wire(initial_tasks), all_tasks_added);
                }
                entity
            }
        };
        info!(%job_id, "add_job");
        state.jobs.insert(job_id, entity);

        self.drive_placement(&mut state, job_id).await
    }

    async fn add_tasks_to_grid_job(
        &self,
        job_id: JobId,
        tasks: Vec<GridTaskInput>,
        all_tasks_added: bool,
    ) -> Response {
        let mut state = self.state.lock().await;
        let Ok(job) = state.job_mut(job_id) else {
            return Response::Error { message: format!("unknown job: {job_id}") };
        };
        let Some(grid) = job.as_grid_mut() else {
            return Response::Error { message: format!("job {job_id} is not a grid job") };
        };
        if grid.all_tasks_added {
            return Response::Error { message: format!("job {job_id} has already sealed its task list") };
        }
        info!(%job_id, added = tasks.len(), all_tasks_added, "add_tasks_to_grid_job");
        grid.add_tasks(tasks_from_wire(tasks), all_tasks_added);

        self.drive_placement(&mut state, job_id).await
    }

    /// Common tail of `add_job`/`add_tasks_to_grid_job`: re-run placement
    /// now that `num_workers_needed()` may have increased (§4.2.1).
    async fn drive_placement(&self, state: &mut CoordinatorState, job_id: JobId) -> Response {
        match on_job_workers_needed_changed(state, job_id, self.creator.as_deref(), &self.config).await {
            Ok(_) => Response::Ok,
            Err(err) => Response::Error { message: err.to_string() },
        }
    }

    async fn get_simple_job_states(&self, job_ids: Vec<JobId>) -> Response {
        let state = self.state.lock().await;
        debug!(count = job_ids.len(), "get_simple_job_states");
        let mut states = Vec::with_capacity(job_ids.len());
        for job_id in job_ids {
            let Ok(job) = state.job(job_id) else {
                return Response::Error { message: format!("unknown job: {job_id}") };
            };
            let Some(simple) = job.as_simple() else {
                return Response::Error { message: format!("job {job_id} is not a simple job") };
            };
            states.push(simple.state.clone());
        }
        Response::SimpleJobStates { states }
    }

    async fn get_grid_task_states(&self, job_id: JobId, filter: fleet_wire::GridTaskFilter) -> Response {
        let state = self.state.lock().await;
        debug!(%job_id, "get_grid_task_states");
        let Ok(job) = state.job(job_id) else {
            return Response::Error { message: format!("unknown job: {job_id}") };
        };
        let Some(grid) = job.as_grid() else {
            return Response::Error { message: format!("job {job_id} is not a grid job") };
        };
        let states = match filter.task_ids {
            Some(task_ids) => task_ids
                .into_iter()
                .filter_map(|id| grid.all_tasks.get(&id).map(|t| (id, t.state.clone())))
                .collect(),
            None => grid.all_tasks.iter().map(|(id, t)| (*id, t.state.clone())).collect(),
        };
        Response::GridTaskStates { states }
    }

    async fn get_agent_states(&self, filter: AgentFilter) -> Response {
        let state = self.state.lock().await;
        debug!("get_agent_states");
        let agents = state
            .agents
            .values()
            .filter(|a| match filter.job_id {
                Some(wanted) => a.job_id() == Some(wanted),
                None => true,
            })
            .map(|a| AgentSnapshot {
                agent_id: a.agent_id,
                kind: match &a.kind {
                    fleet_core::AgentKind::Generic => AgentKindSnapshot::Generic,
                    fleet_core::AgentKind::JobSpecific { job_id, has_registered } => {
                        AgentKindSnapshot::JobSpecific { job_id: *job_id, has_registered: *has_registered }
                    }
                },
                total_resources: a.total_resources.clone(),
                available_resources: a.available_resources.clone(),
                pending_worker_count: a.pending_workers.len(),
            })
            .collect();
        Response::AgentStates { agents }
    }

    async fn register_agent(
        &self,
        agent_id: fleet_core::AgentId,
        total_resources: Resources,
        job_id: Option<JobId>,
    ) -> Response {
        let now = self.clock.epoch_ms();
        let mut state = self.state.lock().await;
        info!(%agent_id, ?job_id, "register_agent");
        if let Err(err) = register_agent(&mut state, agent_id, total_resources, job_id, now) {
            return Response::Error { message: err.to_string() };
        }
        let mut rng = StdRng::from_entropy();
        if let Err(err) = on_agent_available_resources_changed(&mut state, agent_id, &mut rng) {
            warn!(%agent_id, %err, "placement after registration failed");
        }
        Response::Registered { record: RegistrationRecord { agent_id } }
    }

    async fn get_next_jobs(&self, agent_id: fleet_core::AgentId) -> Response {
        let now = self.clock.epoch_ms();
        let mut state = self.state.lock().await;
        debug!(%agent_id, "get_next_jobs");
        match get_next_jobs(&mut state, agent_id, now) {
            Ok(drained) => Response::NextJobs {
                dispatch: drained
                    .into_iter()
                    .map(|w| DispatchRecord { job_id: w.job_id, grid_worker_id: w.grid_worker_id })
                    .collect(),
            },
            Err(err) => Response::Error { message: err.to_string() },
        }
    }

    async fn update_job_states(&self, updates: Vec<fleet_wire::JobStateUpdate>) -> Response {
        let mut state = self.state.lock().await;
        let mut errors = Vec::new();
        for update in updates {
            let result = match update.worker_id {
                Some(worker_id) => {
                    update_grid_job_state(&mut state, update.job_id, worker_id, update.state.clone())
                }
                None => update_simple_job_state(&mut state, update.job_id, update.state.clone()),
            };
            match result {
                Ok(agent_id) => {
                    let mut rng = StdRng::from_entropy();
                    if let Err(err) = on_agent_available_resources_changed(&mut state, agent_id, &mut rng) {
                        warn!(%agent_id, %err, "placement after state update failed");
                    }
                }
                Err(err) => {
                    warn!(job_id = %update.job_id, %err, "update_job_states rejected an update");
                    errors.push(err.to_string());
                }
            }
        }
        if errors.is_empty() {
            Response::Ok
        } else {
            Response::Error { message: errors.join("; ") }
        }
    }

    async fn update_grid_task_state_and_get_next(
        &self,
        job_id: JobId,
        worker_id: fleet_core::GridWorkerId,
        completed_task_id: Option<fleet_core::TaskId>,
        completed_state: Option<ProcessState>,
    ) -> Response {
        let completed = match (completed_task_id, completed_state) {
            (Some(task_id), Some(state)) => Some((task_id, state)),
            (None, None) => None,
            _ => {
                return Response::Error {
                    message: "completed_task_id and completed_state must be given together".into(),
                }
            }
        };
        let mut state = self.state.lock().await;
        debug!(%job_id, %worker_id, "update_grid_task_state_and_get_next");
        match update_grid_task_state_and_get_next(&mut state, job_id, worker_id, completed) {
            Ok(Some((task_id, pickled_arguments))) => {
                Response::NextTask { next: NextTask::Task { task_id, pickled_arguments } }
            }
            Ok(None) => Response::NextTask { next: NextTask::NoMoreWork },
            Err(err) => Response::Error { message: err.to_string() },
        }
    }
}

fn tasks_from_wire(tasks: Vec<GridTaskInput>) -> Vec<(fleet_core::TaskId, Vec<u8>)> {
    tasks.into_iter().map(|t| (t.task_id, t.pickled_arguments)).collect()
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
