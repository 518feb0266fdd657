// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cloud [`AgentCreator`] variant (§4.4, §4.5): launches job-specific
//! agents via a [`CloudClient`] and keeps a periodically-refreshed instance
//! type catalog behind a [`PriceCatalogSource`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use fleet_core::{AgentId, JobId};

use crate::catalog::{Catalog, OnDemandOrSpot};
use crate::cloud_client::{CloudClient, LaunchRequest};
use crate::creator::AgentCreator;
use crate::error::AgentCreatorError;
use crate::pricing::{build_catalog, PriceCatalogSource};

/// Default interval between catalog refreshes (§4.5).
pub const EC2_PRICES_UPDATE_SECS: u64 = 15 * 60;

/// How long callers will wait for the first catalog refresh before giving up.
const FIRST_REFRESH_TIMEOUT: Duration = Duration::from_secs(5 * 60);

struct CatalogState {
    catalog: RwLock<Option<Catalog>>,
    first_refresh_done: Notify,
}

/// Launches job-specific agents as cloud instances, refreshing the
/// instance-type catalog on a background interval so placement decisions
/// (§4.1) always see current pricing and interruption data.
pub struct CloudAgentCreator {
    client: Arc<dyn CloudClient>,
    state: Arc<CatalogState>,
    coordinator_addr: String,
    cancel: CancellationToken,
    refresh_task: JoinHandle<()>,
}

impl CloudAgentCreator {
    /// Spawns the background refresh loop immediately; the first refresh
    /// happens asynchronously, so callers must still await
    /// [`AgentCreator::wait_for_instance_types`] (or `get_instance_types` if a
    /// non-blocking "has it arrived yet" check is all that's needed) before
    /// relying on the catalog.
    pub fn new(
        client: Arc<dyn CloudClient>,
        source: Arc<dyn PriceCatalogSource>,
        coordinator_addr: String,
        refresh_interval: Duration,
    ) -> Self {
        let state = Arc::new(CatalogState { catalog: RwLock::new(None), first_refresh_done: Notify::new() });
        let cancel = CancellationToken::new();

        let refresh_task = tokio::spawn(refresh_loop(source, state.clone(), refresh_interval, cancel.clone()));

        Self { client, state, coordinator_addr, cancel, refresh_task }
    }

    pub fn with_default_interval(
        client: Arc<dyn CloudClient>,
        source: Arc<dyn PriceCatalogSource>,
        coordinator_addr: String,
    ) -> Self {
        Self::new(client, source, coordinator_addr, Duration::from_secs(EC2_PRICES_UPDATE_SECS))
    }

    /// Blocks until the first catalog refresh completes, or returns
    /// [`AgentCreatorError::CatalogTimeout`] after five minutes (§4.5).
    pub async fn wait_for_first_refresh(&self) -> Result<(), AgentCreatorError> {
        if self.state.catalog.read().is_some() {
            return Ok(());
        }
        tokio::time::timeout(FIRST_REFRESH_TIMEOUT, self.state.first_refresh_done.notified())
            .await
            .map_err(|_| AgentCreatorError::CatalogTimeout)
    }
}

async fn refresh_loop(
    source: Arc<dyn PriceCatalogSource>,
    state: Arc<CatalogState>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    let mut is_first = true;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("catalog refresh loop cancelled");
                return;
            }
            _ = ticker.tick() => {
                match build_catalog(source.as_ref()).await {
                    Ok(catalog) => {
                        info!(rows = catalog.len(), "refreshed instance-type catalog");
                        *state.catalog.write() = Some(catalog);
                        if is_first {
                            state.first_refresh_done.notify_waiters();
                            is_first = false;
                        }
                    }
                    Err(err) => {
                        warn!(%err, "catalog refresh failed, keeping stale catalog");
                    }
                }
            }
        }
    }
}

#[async_trait]
impl AgentCreator for CloudAgentCreator {
    async fn get_instance_types(&self) -> Option<Catalog> {
        self.state.catalog.read().clone()
    }

    async fn wait_for_instance_types(&self) -> Option<Catalog> {
        if let Err(err) = self.wait_for_first_refresh().await {
            warn!(%err, "gave up waiting for the instance-type catalog's first refresh");
        }
        self.get_instance_types().await
    }

    async fn launch_job_specific_agent(
        &self,
        agent_id: AgentId,
        job_id: JobId,
        instance_type: &str,
        mode: OnDemandOrSpot,
    ) -> Result<(), AgentCreatorError> {
        let catalog = self
            .get_instance_types()
            .await
            .ok_or_else(|| AgentCreatorError::CatalogSourceUnavailable("catalog not yet populated".into()))?;
        let row = catalog
            .iter()
            .find(|r| r.instance_type == instance_type && r.on_demand_or_spot == mode)
            .ok_or_else(|| AgentCreatorError::LaunchRejected(format!("unknown instance type {instance_type}")))?;

        self.client
            .launch_instance(LaunchRequest {
                agent_id,
                job_id,
                instance_type: instance_type.to_string(),
                mode,
                memory_gb: row.memory_gb,
                logical_cpu: row.logical_cpu,
                coordinator_addr: self.coordinator_addr.clone(),
            })
            .await
    }

    async fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for CloudAgentCreator {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.refresh_task.abort();
    }
}

#[cfg(test)]
#[path = "cloud_tests.rs"]
mod tests;
