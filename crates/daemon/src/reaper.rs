// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic liveness sweep: calls `Coordinator::reap_dead_agents` on an
//! interval, using `tokio::time::interval` + a `CancellationToken` for clean
//! shutdown, the same shape as the other periodic background tasks here.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::coordinator::Coordinator;

/// Spawns the reaper loop, returning its join handle so callers can await it
/// during shutdown.
pub fn spawn<C: fleet_core::Clock + 'static>(
    coordinator: Arc<Coordinator<C>>,
    interval: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("reaper shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    coordinator.reap_dead_agents().await;
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
