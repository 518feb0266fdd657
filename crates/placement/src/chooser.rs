// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance-type chooser (§4.1): a pure function over a catalog table that
//! produces a provisioning plan for a backlog of pending workers.

use fleet_agents::{Catalog, OnDemandOrSpot};
use fleet_core::Resources;

/// Equivalence-class tolerances used to diversify across instance families
/// with similar economics (§4.1 tie-break rationale, §9 open question 3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChooserTolerances {
    /// USD/hr band around the current minimum price-per-worker.
    pub price_tolerance_usd_per_hour: f64,
    /// Percentage-point band around the current minimum interruption probability.
    pub interruption_tolerance_points: f64,
}

impl Default for ChooserTolerances {
    fn default() -> Self {
        Self { price_tolerance_usd_per_hour: 0.005, interruption_tolerance_points: 1.0 }
    }
}

/// One entry of a provisioning plan: launch `num_instances` of `instance_type`,
/// each expected to host `workers_per_instance` workers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedInstance {
    pub instance_type: String,
    pub on_demand_or_spot: OnDemandOrSpot,
    pub workers_per_instance: u32,
    pub num_instances: u32,
    pub price: f64,
    pub interruption_probability: f64,
}

impl PlannedInstance {
    pub fn total_workers(&self) -> u64 {
        self.num_instances as u64 * self.workers_per_instance as u64
    }
}

struct Candidate {
    instance_type: String,
    on_demand_or_spot: OnDemandOrSpot,
    price: f64,
    interruption_probability: f64,
    workers_per_instance: u32,
    num_instances: u32,
}

/// Selects a cost-optimal, interruption-diverse set of machines to cover
/// `workers_needed` workers of `demand` each, from `catalog`, given an
/// `interruption_threshold` in `[0, 100]` (§4.1 algorithm steps 1-4).
///
/// Returns an empty plan if no catalog row has `interruption_probability <=
/// threshold` and fits `demand` at all (§4.1 Error, testable property 2).
pub fn choose_instances(
    demand: &Resources,
    workers_needed: u32,
    interruption_threshold: f64,
    catalog: &Catalog,
    tolerances: &ChooserTolerances,
) -> Vec<PlannedInstance> {
    let mut candidates: Vec<Candidate> = catalog
        .iter()
        .filter(|row| row.interruption_probability <= interruption_threshold)
        .filter_map(|row| {
            let by_memory =
                if demand.memory_gb > 0.0 { row.memory_gb / demand.memory_gb } else { f64::INFINITY };
            let by_cpu = if demand.logical_cpu > 0 {
                row.logical_cpu as f64 / demand.logical_cpu as f64
            } else {
                f64::INFINITY
            };
            let workers_per_instance = by_memory.min(by_cpu).floor();
            if workers_per_instance < 1.0 {
                return None;
            }
            Some(Candidate {
                instance_type: row.instance_type.clone(),
                on_demand_or_spot: row.on_demand_or_spot,
                price: row.price,
                interruption_probability: row.interruption_probability,
                workers_per_instance: workers_per_instance as u32,
                num_instances: 0,
            })
        })
        .collect();

    let mut remaining: i64 = workers_needed as i64;

    while remaining > 0 && !candidates.is_empty() {
        // Step (a): penalise machines larger than what's still needed.
        let effective_prices: Vec<f64> = candidates
            .iter()
            .map(|c| {
                if c.workers_per_instance as i64 > remaining {
                    c.price / remaining as f64
                } else {
                    c.price / c.workers_per_instance as f64
                }
            })
            .collect();

        // Step (b): restrict to the cheapest price-per-worker equivalence class.
        let min_price = effective_prices.iter().cloned().fold(f64::INFINITY, f64::min);
        let price_eligible: Vec<usize> = effective_prices
            .iter()
            .enumerate()
            .filter(|(_, &p)| p <= min_price + tolerances.price_tolerance_usd_per_hour)
            .map(|(i, _)| i)
            .collect();

        // Step (c): within that class, restrict to the lowest-interruption band.
        let min_interruption = price_eligible
            .iter()
            .map(|&i| candidates[i].interruption_probability)
            .fold(f64::INFINITY, f64::min);
        let mut restricted: Vec<usize> = price_eligible
            .into_iter()
            .filter(|&i| {
                candidates[i].interruption_probability <= min_interruption + tolerances.interruption_tolerance_points
            })
            .collect();

        if restricted.is_empty() {
            break;
        }

        // Step (d): take the largest machine in the restricted set first.
        restricted.sort_by(|&a, &b| candidates[b].workers_per_instance.cmp(&candidates[a].workers_per_instance));
        let mut index = 0usize;
        candidates[restricted[index]].num_instances += 1;
        remaining -= candidates[restricted[index]].workers_per_instance as i64;

        // Step (e): round-robin the *same* restricted set with a wrapping
        // index, re-filtering to whichever members still fit after each pick.
        // The just-chosen row is never removed from the rotation — it stays
        // eligible and can be picked again once the index wraps back to it.
        let mut current = restricted.clone();
        loop {
            current.retain(|&i| candidates[i].workers_per_instance as i64 <= remaining);
            if current.is_empty() {
                break;
            }
            index = (index + 1) % current.len();
            let chosen = current[index];
            candidates[chosen].num_instances += 1;
            remaining -= candidates[chosen].workers_per_instance as i64;
        }
    }

    candidates
        .into_iter()
        .filter(|c| c.num_instances > 0)
        .map(|c| PlannedInstance {
            instance_type: c.instance_type,
            on_demand_or_spot: c.on_demand_or_spot,
            workers_per_instance: c.workers_per_instance,
            num_instances: c.num_instances,
            price: c.price,
            interruption_probability: c.interruption_probability,
        })
        .collect()
}

#[cfg(test)]
#[path = "chooser_tests.rs"]
mod tests;
