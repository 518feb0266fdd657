// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent-creator abstraction (§4.4): the capability the placement engine
//! consumes to obtain new machines. Two concrete variants: [`LocalAgentCreator`]
//! (spawn a child process) and [`CloudAgentCreator`] (launch a cloud instance).

use async_trait::async_trait;

use fleet_core::{AgentId, JobId};

use crate::catalog::{Catalog, OnDemandOrSpot};
use crate::error::AgentCreatorError;

/// A capability for provisioning new agent machines, consumed by the
/// placement engine's Phase B (§4.2.1 step 3).
#[async_trait]
pub trait AgentCreator: Send + Sync {
    /// Returns the current instance-type catalog, or `None` if it has not
    /// been populated yet (e.g. the cloud variant is still warming up).
    async fn get_instance_types(&self) -> Option<Catalog>;

    /// Like [`get_instance_types`](Self::get_instance_types), but waits out
    /// an implementation-defined warm-up window instead of returning `None`
    /// immediately. The placement engine calls this rather than
    /// `get_instance_types` directly, so a job submitted while the catalog
    /// is still cold gets a real answer instead of failing fast.
    ///
    /// The default just defers to `get_instance_types`, which is correct
    /// for variants with no warm-up phase at all.
    async fn wait_for_instance_types(&self) -> Option<Catalog> {
        self.get_instance_types().await
    }

    /// Fire-and-forget launch: returns once the launch *request* is
    /// accepted, not once the machine is up and polling.
    async fn launch_job_specific_agent(
        &self,
        agent_id: AgentId,
        job_id: JobId,
        instance_type: &str,
        mode: OnDemandOrSpot,
    ) -> Result<(), AgentCreatorError>;

    /// Releases background tasks (catalog refresh loop, etc).
    async fn close(&self);
}
