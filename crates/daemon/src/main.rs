// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator binary: wires together configuration, an agent creator
//! (local child-process or Kubernetes-pod-backed, chosen by `FLEET_AGENT_MODE`),
//! the TCP listener, and the periodic liveness reaper.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fleet_agents::{AgentCreator, CloudAgentCreator, KubeCloudClient, LocalAgentCreator};
use fleet_core::Resources;
use fleet_daemon::{Config, Coordinator};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let shutdown = CancellationToken::new();

    let creator = build_agent_creator(&config.bind_addr).await;
    let coordinator = Arc::new(Coordinator::new(creator, config.placement));

    let bound = match fleet_daemon::listener::serve(
        &config.bind_addr,
        Arc::clone(&coordinator),
        config.request_timeout,
        shutdown.clone(),
    )
    .await
    {
        Ok(addr) => addr,
        Err(err) => {
            error!(bind_addr = %config.bind_addr, %err, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(%bound, "fleetd up");

    let reaper = fleet_daemon::reaper::spawn(Arc::clone(&coordinator), config.reaper_interval, shutdown.clone());

    wait_for_shutdown_signal().await;
    info!("shutdown signal received");
    shutdown.cancel();
    let _ = reaper.await;
    coordinator.close().await;
}

/// Builds the agent-creator variant named by `FLEET_AGENT_MODE` (`local`,
/// the default, or `cloud`). Returns `None` if no local agent command is
/// configured either, meaning the coordinator will only ever place work on
/// agents that register themselves directly.
async fn build_agent_creator(coordinator_addr: &str) -> Option<Arc<dyn AgentCreator>> {
    match std::env::var("FLEET_AGENT_MODE").as_deref() {
        Ok("cloud") => {
            let namespace = std::env::var("FLEET_KUBE_NAMESPACE").unwrap_or_else(|_| "default".to_string());
            let Ok(image) = std::env::var("FLEET_AGENT_IMAGE") else {
                error!("FLEET_AGENT_IMAGE must be set in cloud mode");
                std::process::exit(1);
            };
            let client = match kube::Client::try_default().await {
                Ok(client) => client,
                Err(err) => {
                    error!(%err, "failed to build a Kubernetes client from the ambient kubeconfig");
                    std::process::exit(1);
                }
            };
            let cloud_client = Arc::new(KubeCloudClient::new(client, namespace, image));
            let source = Arc::new(fleet_agents::StaticPriceCatalogSource::builtin_default());
            let creator: Arc<dyn AgentCreator> = Arc::new(CloudAgentCreator::with_default_interval(
                cloud_client,
                source,
                coordinator_addr.to_string(),
            ));
            Some(creator)
        }
        _ => {
            let agent_command = std::env::var("FLEET_LOCAL_AGENT_COMMAND").ok()?;
            let memory_gb: f64 = std::env::var("FLEET_LOCAL_AGENT_MEMORY_GB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4.0);
            let logical_cpu: u32 = std::env::var("FLEET_LOCAL_AGENT_CPU")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2);
            let creator: Arc<dyn AgentCreator> = Arc::new(LocalAgentCreator::new(
                agent_command,
                Resources::new(memory_gb, logical_cpu),
                coordinator_addr.to_string(),
            ));
            Some(creator)
        }
    }
}

async fn wait_for_shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for ctrl-c, shutting down immediately");
    }
}
