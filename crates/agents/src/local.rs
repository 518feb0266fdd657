// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local agent-creator: provisions by spawning a child process on the
//! coordinator's own machine. No pricing or interruption data — single
//! free-standing instance type at the host's configured capacity and zero
//! interruption probability, for single-machine development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use tokio::process::{Child, Command};
use tracing::{info, warn};

use fleet_core::{AgentId, JobId, Resources};

use crate::catalog::{Catalog, CatalogRow, OnDemandOrSpot};
use crate::creator::AgentCreator;
use crate::error::AgentCreatorError;

const LOCAL_INSTANCE_TYPE: &str = "local";

/// Spawns the agent binary as a child process, passing the coordinator
/// address, agent id, and job id as environment variables — the local
/// analogue of the cloud variant's instance user-data bootstrap file (§6.2).
pub struct LocalAgentCreator {
    agent_command: String,
    host_resources: Resources,
    coordinator_addr: String,
    children: Mutex<HashMap<AgentId, Child>>,
}

impl LocalAgentCreator {
    pub fn new(agent_command: String, host_resources: Resources, coordinator_addr: String) -> Self {
        Self { agent_command, host_resources, coordinator_addr, children: Mutex::new(HashMap::new()) }
    }
}

#[async_trait]
impl AgentCreator for LocalAgentCreator {
    async fn get_instance_types(&self) -> Option<Catalog> {
        Some(vec![CatalogRow {
            instance_type: LOCAL_INSTANCE_TYPE.to_string(),
            memory_gb: self.host_resources.memory_gb,
            logical_cpu: self.host_resources.logical_cpu,
            price: 0.0,
            interruption_probability: 0.0,
            on_demand_or_spot: OnDemandOrSpot::OnDemand,
        }])
    }

    async fn launch_job_specific_agent(
        &self,
        agent_id: AgentId,
        job_id: JobId,
        instance_type: &str,
        _mode: OnDemandOrSpot,
    ) -> Result<(), AgentCreatorError> {
        if instance_type != LOCAL_INSTANCE_TYPE {
            return Err(AgentCreatorError::LaunchRejected(format!(
                "local agent creator only serves '{LOCAL_INSTANCE_TYPE}', got '{instance_type}'"
            )));
        }

        let mut parts = self.agent_command.split_whitespace();
        let program = parts.next().ok_or_else(|| {
            AgentCreatorError::SpawnFailed("agent_command is empty".to_string())
        })?;

        let child = Command::new(program)
            .args(parts)
            .env("FLEET_COORDINATOR_ADDR", &self.coordinator_addr)
            .env("FLEET_AGENT_ID", agent_id.as_str())
            .env("FLEET_JOB_ID", job_id.as_str())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AgentCreatorError::SpawnFailed(e.to_string()))?;

        info!(%agent_id, %job_id, "spawned local agent process");
        self.children.lock().insert(agent_id, child);
        Ok(())
    }

    async fn close(&self) {
        let mut children = self.children.lock();
        for (agent_id, child) in children.drain() {
            if let Some(pid) = child.id() {
                if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                    warn!(%agent_id, pid, error = %e, "failed to signal local agent process");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
