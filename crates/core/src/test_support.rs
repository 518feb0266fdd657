// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared across crates (`test-support` feature).

use crate::ids::JobId;
use crate::job::{Job, JobSpec};
use crate::resources::Resources;

crate::builder! {
    pub struct JobSpecBuilder => JobSpec {
        set {
            priority: f64 = 1.0,
            interruption_probability_threshold: f64 = 100.0,
            resources_required: Resources = Resources::new(1.0, 1)
        }
        computed {
            job_id: JobId = JobId::new()
        }
    }
}

/// Builds a ready-to-use simple job with test-default resource demand.
pub fn simple_job(spec: JobSpec) -> Job {
    Job::new_simple(spec)
}

/// Builds a ready-to-use empty grid job (no tasks added yet).
pub fn grid_job(spec: JobSpec) -> Job {
    Job::new_grid(spec)
}
