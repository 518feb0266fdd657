// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque entity identifiers.
//!
//! All cross-references between agents, jobs, tasks and workers go through
//! these IDs rather than direct references: the placement engine has no
//! ownership cycles, only cross-links resolved through the coordinator's
//! owning maps (see `CoordinatorState`).

crate::define_id! {
    /// Identifies an agent (a long-lived process on a worker machine).
    pub struct AgentId("agt-");
}

crate::define_id! {
    /// Identifies a job (simple or grid).
    pub struct JobId("job-");
}

crate::define_id! {
    /// Identifies a single task within a grid job.
    pub struct TaskId("tsk-");
}

crate::define_id! {
    /// Identifies a grid worker (one child process dispatched to run grid tasks).
    pub struct GridWorkerId("gwk-");
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
