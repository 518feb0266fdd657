// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol-level specs: framing round trips an arbitrary request/response
//! pair, and a request against an unknown entity comes back as an `Error`
//! response rather than closing the connection or panicking (§7).

use crate::prelude::*;

use fleet_core::{AgentId, JobId};
use fleet_wire::{AgentFilter, Request, Response};

/// Method names are part of the compatibility surface with existing agents
/// (see `fleet_wire::Request`'s own doc comment); this pins the literal JSON
/// shape so a refactor that renames a variant fails loudly here instead of
/// silently breaking every already-deployed agent.
#[test]
fn check_s_wire_shape_is_the_bare_tagged_variant() {
    let json = serde_json::to_value(Request::Check).expect("serialize");
    assert_eq!(json, serde_json::json!({ "method": "Check" }));
}

#[tokio::test]
async fn check_is_answered_with_pong() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    assert_eq!(client.call(&Request::Check).await, Response::Pong);

    server.shutdown().await;
}

#[tokio::test]
async fn get_next_jobs_for_an_unregistered_agent_is_an_error_not_a_panic() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let response = client.call(&Request::GetNextJobs { agent_id: AgentId::new() }).await;
    assert!(matches!(response, Response::Error { .. }), "expected Error, got {response:?}");

    // The connection (and the coordinator behind it) must still be usable.
    assert_eq!(client.call(&Request::Check).await, Response::Pong);

    server.shutdown().await;
}

#[tokio::test]
async fn querying_simple_job_states_for_an_unknown_job_is_an_error() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let response = client.call(&Request::GetSimpleJobStates { job_ids: vec![JobId::new()] }).await;
    assert!(matches!(response, Response::Error { .. }), "expected Error, got {response:?}");

    server.shutdown().await;
}

#[tokio::test]
async fn get_agent_states_can_be_filtered_by_job() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let generic_agent = AgentId::new();
    client
        .call(&Request::RegisterAgent {
            agent_id: generic_agent,
            total_resources: fleet_core::Resources::new(8.0, 4),
            job_id: None,
        })
        .await;

    let all = client.call(&Request::GetAgentStates { filter: AgentFilter::default() }).await;
    let Response::AgentStates { agents } = all else { panic!("expected AgentStates") };
    assert_eq!(agents.len(), 1);

    let filtered = client
        .call(&Request::GetAgentStates { filter: AgentFilter { job_id: Some(JobId::new()) } })
        .await;
    assert_eq!(filtered, Response::AgentStates { agents: Vec::new() }, "no job-specific agent matches a fresh job id");

    server.shutdown().await;
}
