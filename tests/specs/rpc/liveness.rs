// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness specs: an agent that stops polling is eventually declared dead,
//! its in-flight grid task is failed with `UNEXPECTED_WORKER_EXIT`, and a
//! simple job it was carrying is simply freed up to be replaced (§9 Open
//! Question 1).

use crate::prelude::*;

use fleet_core::{AgentId, FakeClock, JobId, ProcessState, Resources, TaskId};
use fleet_placement::PlacementConfig;
use fleet_wire::{GridTaskInput, JobDefinition, JobDefinitionKind, Request, Response};

fn config_with_short_timeout() -> PlacementConfig {
    PlacementConfig { agent_dead_timeout_ms: 1_000, ..PlacementConfig::default() }
}

#[tokio::test]
async fn a_silent_agent_is_reaped_and_its_in_flight_task_fails() {
    let clock = FakeClock::new();
    let server = TestServer::<FakeClock>::start_with_clock(config_with_short_timeout(), clock.clone()).await;
    let mut client = server.connect().await;

    let agent_id = AgentId::new();
    client
        .call(&Request::RegisterAgent { agent_id, total_resources: Resources::new(1.0, 1), job_id: None })
        .await;

    let job_id = JobId::new();
    let task_id = TaskId::new();
    client
        .call(&Request::AddJob {
            job: JobDefinition {
                job_id,
                priority: 1.0,
                interruption_probability_threshold: 100.0,
                resources_required: Resources::new(1.0, 1),
                kind: JobDefinitionKind::Grid {
                    initial_tasks: vec![GridTaskInput { task_id, pickled_arguments: vec![1] }],
                    all_tasks_added: true,
                },
            },
        })
        .await;

    let next = client.call(&Request::GetNextJobs { agent_id }).await;
    let Response::NextJobs { dispatch } = next else { panic!("expected NextJobs, got {next:?}") };
    let worker_id = dispatch[0].grid_worker_id.expect("grid worker id");

    // Pull the one task so it is bound to the worker, not merely reserved.
    client
        .call(&Request::UpdateGridTaskStateAndGetNext {
            job_id,
            worker_id,
            completed_task_id: None,
            completed_state: None,
        })
        .await;

    // The agent goes silent well past the dead timeout.
    clock.advance(std::time::Duration::from_secs(10));
    server.force_reap().await;

    let states = client
        .call(&Request::GetGridTaskStates { job_id, filter: Default::default() })
        .await;
    let Response::GridTaskStates { states } = states else { panic!("expected GridTaskStates") };
    let (_, state) = states.into_iter().find(|(id, _)| *id == task_id).expect("task still exists");
    assert!(
        matches!(state, ProcessState::UnexpectedWorkerExit(_)),
        "in-flight task should fail with UnexpectedWorkerExit, got {state:?}"
    );

    let agents = client.call(&Request::GetAgentStates { filter: Default::default() }).await;
    assert_eq!(agents, Response::AgentStates { agents: Vec::new() }, "the dead agent is removed entirely");

    server.shutdown().await;
}

#[tokio::test]
async fn reaping_a_simple_jobs_agent_replaces_the_lost_worker_on_a_second_agent() {
    let clock = FakeClock::new();
    let server = TestServer::<FakeClock>::start_with_clock(config_with_short_timeout(), clock.clone()).await;
    let mut client = server.connect().await;

    let dying_agent = AgentId::new();
    client
        .call(&Request::RegisterAgent { agent_id: dying_agent, total_resources: Resources::new(1.0, 1), job_id: None })
        .await;

    let job_id = JobId::new();
    client
        .call(&Request::AddJob {
            job: JobDefinition {
                job_id,
                priority: 1.0,
                interruption_probability_threshold: 100.0,
                resources_required: Resources::new(1.0, 1),
                kind: JobDefinitionKind::Simple,
            },
        })
        .await;

    // The dying agent goes silent past the timeout...
    clock.advance(std::time::Duration::from_millis(1_500));

    // ...but a second agent registers just now, so reaping has somewhere
    // fresh to replace the lost worker instead of failing the job.
    let standby_agent = AgentId::new();
    client
        .call(&Request::RegisterAgent {
            agent_id: standby_agent,
            total_resources: Resources::new(1.0, 1),
            job_id: None,
        })
        .await;

    server.force_reap().await;

    let states = client.call(&Request::GetSimpleJobStates { job_ids: vec![job_id] }).await;
    assert_eq!(
        states,
        Response::SimpleJobStates { states: vec![ProcessState::RunRequested] },
        "the job survives, now carried by the standby agent"
    );

    let next = client.call(&Request::GetNextJobs { agent_id: standby_agent }).await;
    let Response::NextJobs { dispatch } = next else { panic!("expected NextJobs, got {next:?}") };
    assert_eq!(dispatch.len(), 1, "the standby agent should have picked up the orphaned worker");
    assert_eq!(dispatch[0].job_id, job_id);

    server.shutdown().await;
}
