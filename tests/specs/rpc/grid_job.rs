// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Grid job specs: a backlog of tasks fanned out across pull-dispatched
//! workers, including the late-report-is-ignored edge case (§9 Open
//! Question 4).

use crate::prelude::*;

use fleet_core::{AgentId, JobId, ProcessState, Resources, TaskId};
use fleet_wire::{GridTaskInput, JobDefinition, JobDefinitionKind, NextTask, Request, Response};

fn task(n: u8) -> GridTaskInput {
    GridTaskInput { task_id: TaskId::new(), pickled_arguments: vec![n] }
}

#[tokio::test]
async fn grid_job_fans_out_tasks_to_a_single_worker_one_at_a_time() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    // Exactly enough room for one worker's worth of demand, so the grid
    // job's three tasks get fed to it one at a time rather than all at once.
    let agent_id = AgentId::new();
    client
        .call(&Request::RegisterAgent { agent_id, total_resources: Resources::new(1.0, 1), job_id: None })
        .await;

    let job_id = JobId::new();
    let tasks: Vec<GridTaskInput> = (0..3).map(task).collect();
    let task_ids: Vec<TaskId> = tasks.iter().map(|t| t.task_id).collect();

    let add_job = client
        .call(&Request::AddJob {
            job: JobDefinition {
                job_id,
                priority: 1.0,
                interruption_probability_threshold: 100.0,
                resources_required: Resources::new(1.0, 1),
                kind: JobDefinitionKind::Grid { initial_tasks: tasks, all_tasks_added: true },
            },
        })
        .await;
    assert_eq!(add_job, Response::Ok);

    let next = client.call(&Request::GetNextJobs { agent_id }).await;
    let Response::NextJobs { dispatch } = next else { panic!("expected NextJobs, got {next:?}") };
    assert_eq!(dispatch.len(), 1, "one resource-slot's worth of agent capacity, one worker");
    let worker_id = dispatch[0].grid_worker_id.expect("grid jobs mint a worker id");

    // First poll: no completed task yet, just asking for the first one.
    let first = client
        .call(&Request::UpdateGridTaskStateAndGetNext {
            job_id,
            worker_id,
            completed_task_id: None,
            completed_state: None,
        })
        .await;
    let Response::NextTask { next } = first else { panic!("expected NextTask, got {first:?}") };
    let NextTask::Task { task_id: first_task, .. } = next else { panic!("expected a task") };
    assert!(task_ids.contains(&first_task));

    // Report it done, pull the next one.
    let second = client
        .call(&Request::UpdateGridTaskStateAndGetNext {
            job_id,
            worker_id,
            completed_task_id: Some(first_task),
            completed_state: Some(ProcessState::Succeeded(None)),
        })
        .await;
    let Response::NextTask { next } = second else { panic!("expected NextTask, got {second:?}") };
    let NextTask::Task { task_id: second_task, .. } = next else { panic!("expected a task") };
    assert_ne!(second_task, first_task);

    // A late, duplicate report of the first (already-succeeded) task is
    // ignored rather than rejected (§9 Open Question 4).
    let late = client
        .call(&Request::UpdateGridTaskStateAndGetNext {
            job_id,
            worker_id,
            completed_task_id: Some(first_task),
            completed_state: Some(ProcessState::FailedWithResult(None)),
        })
        .await;
    assert!(matches!(late, Response::NextTask { .. }), "late report should not error: {late:?}");

    let states = client
        .call(&Request::GetGridTaskStates { job_id, filter: Default::default() })
        .await;
    let Response::GridTaskStates { states } = states else { panic!("expected GridTaskStates") };
    let first_state = states.iter().find(|(id, _)| *id == first_task).map(|(_, s)| s.clone());
    assert_eq!(
        first_state,
        Some(ProcessState::Succeeded(None)),
        "late report must not have clobbered the earlier success"
    );

    server.shutdown().await;
}
