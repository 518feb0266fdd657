// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-placement: the coordinator's entity graph (§3) and the placement
//! engine (§4) that mutates it — the instance-type chooser, the two
//! placement entry points, the pull-based dispatch protocol, and the
//! liveness reaper.

pub mod chooser;
pub mod engine;
pub mod error;
pub mod state;

pub use chooser::{choose_instances, ChooserTolerances, PlannedInstance};
pub use engine::{
    get_next_jobs, on_agent_available_resources_changed, on_job_workers_needed_changed,
    reap_dead_agents, register_agent, update_grid_job_state, update_grid_task_state_and_get_next,
    update_simple_job_state, PlacementConfig,
};
pub use error::PlacementError;
pub use state::CoordinatorState;
