// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-dimensional resource vectors: memory, logical CPU, and named custom resources.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A resource vector used both as supply (on an agent) and demand (per worker).
///
/// `custom` holds named resources beyond memory/CPU (GPUs, licenses, ...). A `BTreeMap`
/// is used so two `Resources` with the same contents compare and hash identically
/// regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub memory_gb: f64,
    pub logical_cpu: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, f64>,
}

impl Resources {
    pub fn new(memory_gb: f64, logical_cpu: u32) -> Self {
        Self { memory_gb, logical_cpu, custom: BTreeMap::new() }
    }

    pub fn with_custom(mut self, name: impl Into<String>, amount: f64) -> Self {
        self.custom.insert(name.into(), amount);
        self
    }

    /// Subtracts `required` from `self`, returning `None` if any dimension would
    /// underflow (including a custom resource named in `required` but absent here).
    pub fn subtract(&self, required: &Resources) -> Option<Resources> {
        if self.memory_gb < required.memory_gb || self.logical_cpu < required.logical_cpu {
            return None;
        }
        let mut custom = self.custom.clone();
        for (name, amount) in &required.custom {
            let have = custom.get(name).copied().unwrap_or(0.0);
            if have < *amount {
                return None;
            }
            custom.insert(name.clone(), have - amount);
        }
        Some(Resources {
            memory_gb: self.memory_gb - required.memory_gb,
            logical_cpu: self.logical_cpu - required.logical_cpu,
            custom,
        })
    }

    /// Adds `returned` back into `self` (releasing a worker's reservation).
    pub fn add(&self, returned: &Resources) -> Resources {
        let mut custom = self.custom.clone();
        for (name, amount) in &returned.custom {
            *custom.entry(name.clone()).or_insert(0.0) += amount;
        }
        Resources {
            memory_gb: self.memory_gb + returned.memory_gb,
            logical_cpu: self.logical_cpu + returned.logical_cpu,
            custom,
        }
    }

    /// `true` if `self` could host `required` when completely free (used for the
    /// fail-fast "this job can never run anywhere" check).
    pub fn can_ever_fit(&self, required: &Resources) -> bool {
        self.subtract(required).is_some()
    }
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
