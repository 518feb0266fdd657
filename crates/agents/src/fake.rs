// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-memory [`AgentCreator`] for placement-engine tests (`test-support`
//! feature): records every launch request instead of spawning a process or
//! calling a cloud API.

use parking_lot::Mutex;

use async_trait::async_trait;

use fleet_core::{AgentId, JobId};

use crate::catalog::{Catalog, OnDemandOrSpot};
use crate::creator::AgentCreator;
use crate::error::AgentCreatorError;

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchCall {
    pub agent_id: AgentId,
    pub job_id: JobId,
    pub instance_type: String,
    pub mode: OnDemandOrSpot,
}

/// A fake agent creator that serves a fixed catalog and records launches
/// instead of performing them, for exercising the placement engine's Phase B
/// (§4.2.1) in isolation.
pub struct FakeAgentCreator {
    catalog: Mutex<Option<Catalog>>,
    launches: Mutex<Vec<LaunchCall>>,
    reject_next: Mutex<Option<String>>,
}

impl FakeAgentCreator {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog: Mutex::new(Some(catalog)), launches: Mutex::new(Vec::new()), reject_next: Mutex::new(None) }
    }

    /// A creator whose catalog has not arrived yet, modeling a cloud variant
    /// still waiting on its first refresh.
    pub fn empty() -> Self {
        Self { catalog: Mutex::new(None), launches: Mutex::new(Vec::new()), reject_next: Mutex::new(None) }
    }

    pub fn set_catalog(&self, catalog: Catalog) {
        *self.catalog.lock() = Some(catalog);
    }

    pub fn launches(&self) -> Vec<LaunchCall> {
        self.launches.lock().clone()
    }

    /// Makes the next `launch_job_specific_agent` call fail with the given
    /// message, then resume succeeding.
    pub fn reject_next_launch(&self, reason: impl Into<String>) {
        *self.reject_next.lock() = Some(reason.into());
    }
}

#[async_trait]
impl AgentCreator for FakeAgentCreator {
    async fn get_instance_types(&self) -> Option<Catalog> {
        self.catalog.lock().clone()
    }

    async fn launch_job_specific_agent(
        &self,
        agent_id: AgentId,
        job_id: JobId,
        instance_type: &str,
        mode: OnDemandOrSpot,
    ) -> Result<(), AgentCreatorError> {
        if let Some(reason) = self.reject_next.lock().take() {
            return Err(AgentCreatorError::LaunchRejected(reason));
        }
        self.launches.lock().push(LaunchCall {
            agent_id,
            job_id,
            instance_type: instance_type.to_string(),
            mode,
        });
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
