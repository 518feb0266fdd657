// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioning specs: when no existing generic agent fits, the coordinator
//! asks the agent creator to launch new job-specific capacity (§4.2.1 Phase
//! B), and rolls the reservation back if the launch itself fails.

use std::sync::Arc;

use crate::prelude::*;

use fleet_agents::{AgentCreator, CatalogRow, FakeAgentCreator, OnDemandOrSpot};
use fleet_core::{JobId, ProcessState, Resources};
use fleet_placement::PlacementConfig;
use fleet_wire::{JobDefinition, JobDefinitionKind, Request, Response};

fn catalog_row() -> CatalogRow {
    CatalogRow {
        instance_type: "m.test".into(),
        memory_gb: 4.0,
        logical_cpu: 2,
        price: 0.10,
        interruption_probability: 5.0,
        on_demand_or_spot: OnDemandOrSpot::OnDemand,
    }
}

#[tokio::test]
async fn job_with_no_fitting_generic_agent_provisions_a_new_one() {
    let creator = Arc::new(FakeAgentCreator::new(vec![catalog_row()]));
    let server =
        TestServer::start_with(Some(creator.clone() as Arc<dyn AgentCreator>), PlacementConfig::default())
            .await;
    let mut client = server.connect().await;

    let job_id = JobId::new();
    let add_job = client
        .call(&Request::AddJob {
            job: JobDefinition {
                job_id,
                priority: 1.0,
                interruption_probability_threshold: 100.0,
                resources_required: Resources::new(4.0, 2),
                kind: JobDefinitionKind::Simple,
            },
        })
        .await;
    assert_eq!(add_job, Response::Ok);

    assert_eq!(creator.launches().len(), 1, "Phase B must launch exactly one job-specific agent");
    let launch = &creator.launches()[0];
    assert_eq!(launch.job_id, job_id);
    assert_eq!(launch.instance_type, "m.test");

    let agents = client.call(&Request::GetAgentStates { filter: Default::default() }).await;
    let Response::AgentStates { agents } = agents else { panic!("expected AgentStates") };
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].pending_worker_count, 1, "the reserved worker is waiting on the new agent");

    server.shutdown().await;
}

#[tokio::test]
async fn a_failed_launch_rolls_back_its_reservation_and_fails_the_job() {
    let creator = Arc::new(FakeAgentCreator::new(vec![catalog_row()]));
    creator.reject_next_launch("capacity exhausted in this region");
    let server =
        TestServer::start_with(Some(creator.clone() as Arc<dyn AgentCreator>), PlacementConfig::default())
            .await;
    let mut client = server.connect().await;

    let job_id = JobId::new();
    let add_job = client
        .call(&Request::AddJob {
            job: JobDefinition {
                job_id,
                priority: 1.0,
                interruption_probability_threshold: 100.0,
                resources_required: Resources::new(4.0, 2),
                kind: JobDefinitionKind::Simple,
            },
        })
        .await;
    assert!(matches!(add_job, Response::Error { .. }), "expected the launch failure to surface: {add_job:?}");

    let agents = client.call(&Request::GetAgentStates { filter: Default::default() }).await;
    assert_eq!(agents, Response::AgentStates { agents: Vec::new() }, "the failed agent must be rolled back");

    let states = client.call(&Request::GetSimpleJobStates { job_ids: vec![job_id] }).await;
    assert_eq!(
        states,
        Response::SimpleJobStates { states: vec![ProcessState::RunRequested] },
        "the job is left pending, not terminal, so a later registration can still pick it up"
    );

    server.shutdown().await;
}

#[tokio::test]
async fn custom_resource_demand_skips_provisioning_entirely() {
    let creator = Arc::new(FakeAgentCreator::new(vec![catalog_row()]));
    let server =
        TestServer::start_with(Some(creator.clone() as Arc<dyn AgentCreator>), PlacementConfig::default())
            .await;
    let mut client = server.connect().await;

    // No agent exists yet, so without Phase B this job can never be placed;
    // it is expected to fail fast rather than wait forever.
    let job_id = JobId::new();
    client
        .call(&Request::AddJob {
            job: JobDefinition {
                job_id,
                priority: 1.0,
                interruption_probability_threshold: 100.0,
                resources_required: Resources::new(1.0, 1).with_custom("gpu", 1.0),
                kind: JobDefinitionKind::Simple,
            },
        })
        .await;

    assert!(creator.launches().is_empty(), "the chooser has no way to match custom resources to instance types");

    let states = client.call(&Request::GetSimpleJobStates { job_ids: vec![job_id] }).await;
    assert_eq!(
        states,
        Response::SimpleJobStates { states: vec![ProcessState::ResourcesNotAvailable] },
        "provisioning never runs for custom-resource demand, so nothing could ever host it"
    );

    server.shutdown().await;
}
