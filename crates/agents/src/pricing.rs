// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalog construction: joining on-demand prices, spot prices, and
//! interruption probabilities into the chooser's input table (§4.4, §6.3).
//!
//! Real cloud pricing/interruption feeds are out of scope (§1); this module
//! defines the join semantics against a [`PriceCatalogSource`] trait object,
//! with [`StaticPriceCatalogSource`] as the concrete stand-in that reads a
//! seeded TOML table instead of calling a cloud API.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::catalog::{Catalog, CatalogRow, OnDemandOrSpot};
use crate::error::AgentCreatorError;

/// Pessimistic default used when an instance type has no interruption-advisor
/// entry (§4.4, §6.3).
pub const DEFAULT_INTERRUPTION_PROBABILITY: f64 = 80.0;

#[derive(Debug, Clone, Deserialize)]
pub struct PriceRow {
    pub instance_type: String,
    pub memory_gb: f64,
    pub logical_cpu: u32,
    pub price: f64,
}

/// A source of raw pricing/interruption data, joined by [`build_catalog`]
/// into a [`Catalog`]. The cloud variant would call cloud-provider SDKs
/// here; that call is out of scope and left to the concrete implementation.
#[async_trait]
pub trait PriceCatalogSource: Send + Sync {
    async fn on_demand_rows(&self) -> Result<Vec<PriceRow>, AgentCreatorError>;
    async fn spot_rows(&self) -> Result<Vec<PriceRow>, AgentCreatorError>;
    async fn interruption_probabilities(&self) -> Result<HashMap<String, f64>, AgentCreatorError>;
}

/// Joins the three feeds into a catalog: on-demand rows at 0% interruption,
/// spot rows left-joined against the interruption table (missing entries
/// fall back to [`DEFAULT_INTERRUPTION_PROBABILITY`]).
pub async fn build_catalog(source: &dyn PriceCatalogSource) -> Result<Catalog, AgentCreatorError> {
    let on_demand = source.on_demand_rows().await?;
    let spot = source.spot_rows().await?;
    let interruption = source.interruption_probabilities().await?;

    let mut catalog = Vec::with_capacity(on_demand.len() + spot.len());
    for row in on_demand {
        catalog.push(CatalogRow {
            instance_type: row.instance_type,
            memory_gb: row.memory_gb,
            logical_cpu: row.logical_cpu,
            price: row.price,
            interruption_probability: 0.0,
            on_demand_or_spot: OnDemandOrSpot::OnDemand,
        });
    }
    for row in spot {
        let interruption_probability = interruption
            .get(&row.instance_type)
            .copied()
            .unwrap_or(DEFAULT_INTERRUPTION_PROBABILITY);
        catalog.push(CatalogRow {
            instance_type: row.instance_type,
            memory_gb: row.memory_gb,
            logical_cpu: row.logical_cpu,
            price: row.price,
            interruption_probability,
            on_demand_or_spot: OnDemandOrSpot::Spot,
        });
    }
    Ok(catalog)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StaticCatalogFile {
    #[serde(default)]
    on_demand: Vec<PriceRow>,
    #[serde(default)]
    spot: Vec<PriceRow>,
    #[serde(default)]
    interruption_probabilities: HashMap<String, f64>,
}

/// A seeded, file-backed catalog source: reads a TOML table of on-demand
/// rows, spot rows, and interruption probabilities instead of calling a
/// cloud pricing API.
pub struct StaticPriceCatalogSource {
    file: StaticCatalogFile,
}

impl StaticPriceCatalogSource {
    pub fn from_toml_str(s: &str) -> Result<Self, AgentCreatorError> {
        let file: StaticCatalogFile =
            toml::from_str(s).map_err(|e| AgentCreatorError::CatalogSourceUnavailable(e.to_string()))?;
        Ok(Self { file })
    }

    pub fn from_path(path: &Path) -> Result<Self, AgentCreatorError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AgentCreatorError::CatalogSourceUnavailable(e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    /// A small built-in seed table, used when no catalog file is configured.
    #[allow(clippy::expect_used)]
    pub fn builtin_default() -> Self {
        Self::from_toml_str(include_str!("default_catalog.toml"))
            .expect("built-in catalog seed must parse")
    }
}

#[async_trait]
impl PriceCatalogSource for StaticPriceCatalogSource {
    async fn on_demand_rows(&self) -> Result<Vec<PriceRow>, AgentCreatorError> {
        Ok(self.file.on_demand.clone())
    }

    async fn spot_rows(&self) -> Result<Vec<PriceRow>, AgentCreatorError> {
        Ok(self.file.spot.clone())
    }

    async fn interruption_probabilities(&self) -> Result<HashMap<String, f64>, AgentCreatorError> {
        Ok(self.file.interruption_probabilities.clone())
    }
}

#[cfg(test)]
#[path = "pricing_tests.rs"]
mod tests;
