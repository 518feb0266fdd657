// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance-type catalog schema (§4.1, §6.3).

use serde::{Deserialize, Serialize};

/// Cloud pricing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDemandOrSpot {
    OnDemand,
    Spot,
}

/// One row of the instance-type catalog: a purchasable (or locally
/// provisionable) machine shape with its price and interruption risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub instance_type: String,
    pub memory_gb: f64,
    pub logical_cpu: u32,
    /// USD per hour.
    pub price: f64,
    /// Percent, 0-100.
    pub interruption_probability: f64,
    pub on_demand_or_spot: OnDemandOrSpot,
}

/// The full set of candidate machine types the chooser selects from.
pub type Catalog = Vec<CatalogRow>;
