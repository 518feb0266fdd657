// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simple job lifecycle specs: submission through to completion, driven
//! entirely over the wire protocol against a real listener.

use crate::prelude::*;

use fleet_core::{AgentId, JobId, ProcessState, Resources};
use fleet_wire::{JobDefinition, JobDefinitionKind, JobStateUpdate, Request, Response};

fn ample_resources() -> Resources {
    Resources::new(64.0, 16)
}

#[tokio::test]
async fn simple_job_runs_to_completion_on_a_registered_generic_agent() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let agent_id = AgentId::new();
    let registered = client
        .call(&Request::RegisterAgent { agent_id, total_resources: ample_resources(), job_id: None })
        .await;
    assert!(matches!(registered, Response::Registered { record } if record.agent_id == agent_id));

    let job_id = JobId::new();
    let add_job = client
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
    assert_eq!(add_job, Response::Ok);

    // Placement runs synchronously inside add_job, so the dispatch is
    // already waiting in the agent's pending-worker queue.
    let next = client.call(&Request::GetNextJobs { agent_id }).await;
    let Response::NextJobs { dispatch } = next else { panic!("expected NextJobs, got {next:?}") };
    assert_eq!(dispatch.len(), 1);
    assert_eq!(dispatch[0].job_id, job_id);
    assert_eq!(dispatch[0].grid_worker_id, None);

    // A second poll drains nothing further: `get_next_jobs` only returns
    // what accumulated since the last call (§4.3).
    let next_again = client.call(&Request::GetNextJobs { agent_id }).await;
    assert_eq!(next_again, Response::NextJobs { dispatch: Vec::new() });

    let update = client
        .call(&Request::UpdateJobStates {
            updates: vec![JobStateUpdate { job_id, worker_id: None, state: ProcessState::Succeeded(None) }],
        })
        .await;
    assert_eq!(update, Response::Ok);

    let states = client.call(&Request::GetSimpleJobStates { job_ids: vec![job_id] }).await;
    assert_eq!(states, Response::SimpleJobStates { states: vec![ProcessState::Succeeded(None)] });

    let agents = client.call(&Request::GetAgentStates { filter: Default::default() }).await;
    let Response::AgentStates { agents } = agents else { panic!("expected AgentStates") };
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].available_resources, ample_resources(), "completion credits the agent back");

    server.shutdown().await;
}

#[tokio::test]
async fn job_state_cannot_regress_once_terminal() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let agent_id = AgentId::new();
    client.call(&Request::RegisterAgent { agent_id, total_resources: ample_resources(), job_id: None }).await;

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

    let first = client
        .call(&Request::UpdateJobStates {
            updates: vec![JobStateUpdate { job_id, worker_id: None, state: ProcessState::Succeeded(None) }],
        })
        .await;
    assert_eq!(first, Response::Ok);

    let second = client
        .call(&Request::UpdateJobStates {
            updates: vec![JobStateUpdate { job_id, worker_id: None, state: ProcessState::Running }],
        })
        .await;
    assert!(matches!(second, Response::Error { .. }), "terminal states are absorbing, got {second:?}");

    let states = client.call(&Request::GetSimpleJobStates { job_ids: vec![job_id] }).await;
    assert_eq!(states, Response::SimpleJobStates { states: vec![ProcessState::Succeeded(None)] });

    server.shutdown().await;
}

#[tokio::test]
async fn job_with_no_agent_that_could_ever_host_it_fails_fast() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    // One small generic agent: nothing this job could ever fit on.
    let agent_id = AgentId::new();
    client
        .call(&Request::RegisterAgent { agent_id, total_resources: Resources::new(1.0, 1), job_id: None })
        .await;

    let job_id = JobId::new();
    client
        .call(&Request::AddJob {
            job: JobDefinition {
                job_id,
                priority: 1.0,
                interruption_probability_threshold: 100.0,
                resources_required: Resources::new(128.0, 64),
                kind: JobDefinitionKind::Simple,
            },
        })
        .await;

    let states = client.call(&Request::GetSimpleJobStates { job_ids: vec![job_id] }).await;
    assert_eq!(
        states,
        Response::SimpleJobStates { states: vec![ProcessState::ResourcesNotAvailable] }
    );

    server.shutdown().await;
}
