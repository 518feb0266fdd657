// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-agents: the agent-creator abstraction (§4.4) the placement engine
//! uses to provision new machines, plus the instance-type catalog it
//! provisions from — local child-process agents for development, and cloud
//! (Kubernetes-pod-backed) agents for production.

pub mod catalog;
pub mod cloud;
pub mod cloud_client;
pub mod creator;
pub mod error;
pub mod local;
pub mod pricing;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use catalog::{Catalog, CatalogRow, OnDemandOrSpot};
pub use cloud::{CloudAgentCreator, EC2_PRICES_UPDATE_SECS};
pub use cloud_client::{CloudClient, KubeCloudClient, LaunchRequest};
pub use creator::AgentCreator;
pub use error::AgentCreatorError;
pub use local::LocalAgentCreator;
pub use pricing::{build_catalog, PriceCatalogSource, PriceRow, StaticPriceCatalogSource, DEFAULT_INTERRUPTION_PROBABILITY};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAgentCreator, LaunchCall};
