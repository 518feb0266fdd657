// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The narrow cloud-launching contract the cloud agent-creator depends on.
//! Real instance launching is out of scope (§1); [`KubeCloudClient`] is the
//! one concrete implementation shipped here, launching a Kubernetes pod as
//! the stand-in for a cloud instance.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Container, EnvVar, Pod, PodSpec, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{Api, ObjectMeta, PostParams};
use std::collections::BTreeMap;

use fleet_core::{AgentId, JobId};

use crate::catalog::OnDemandOrSpot;
use crate::error::AgentCreatorError;

/// Parameters for launching one job-specific agent machine.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub agent_id: AgentId,
    pub job_id: JobId,
    pub instance_type: String,
    pub mode: OnDemandOrSpot,
    pub memory_gb: f64,
    pub logical_cpu: u32,
    /// Address the spawned agent should dial to reach the coordinator.
    pub coordinator_addr: String,
}

#[async_trait]
pub trait CloudClient: Send + Sync {
    async fn launch_instance(&self, request: LaunchRequest) -> Result<(), AgentCreatorError>;
}

/// Launches job-specific agents as Kubernetes pods: the cluster-native
/// analogue of launching a cloud instance. Resource requests mirror the
/// catalog row's capacity; env vars carry the bootstrap information a real
/// cloud instance would read from its user-data file (§6.2).
pub struct KubeCloudClient {
    client: kube::Client,
    namespace: String,
    image: String,
}

impl KubeCloudClient {
    pub fn new(client: kube::Client, namespace: String, image: String) -> Self {
        Self { client, namespace, image }
    }
}

#[async_trait]
impl CloudClient for KubeCloudClient {
    async fn launch_instance(&self, request: LaunchRequest) -> Result<(), AgentCreatorError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);
        let pod = build_agent_pod(&self.image, &request);
        pods.create(&PostParams::default(), &pod)
            .await
            .map_err(|e| AgentCreatorError::LaunchRejected(e.to_string()))?;
        Ok(())
    }
}

fn build_agent_pod(image: &str, request: &LaunchRequest) -> Pod {
    let mut limits = BTreeMap::new();
    limits.insert("memory".to_string(), Quantity(format!("{}Gi", request.memory_gb)));
    limits.insert("cpu".to_string(), Quantity(request.logical_cpu.to_string()));

    let env = vec![
        env_var("FLEET_COORDINATOR_ADDR", &request.coordinator_addr),
        env_var("FLEET_AGENT_ID", request.agent_id.as_str()),
        env_var("FLEET_JOB_ID", request.job_id.as_str()),
        env_var("FLEET_INSTANCE_TYPE", &request.instance_type),
    ];

    Pod {
        metadata: ObjectMeta {
            generate_name: Some(format!("agent-{}-", request.agent_id.short(8))),
            labels: Some(BTreeMap::from([
                ("fleet.io/agent-id".to_string(), request.agent_id.as_str().to_string()),
                ("fleet.io/job-id".to_string(), request.job_id.as_str().to_string()),
            ])),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "agent".to_string(),
                image: Some(image.to_string()),
                env: Some(env),
                resources: Some(ResourceRequirements {
                    requests: Some(limits.clone()),
                    limits: Some(limits),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            restart_policy: Some("Never".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar { name: name.to_string(), value: Some(value.to_string()), ..Default::default() }
}

#[cfg(test)]
#[path = "cloud_client_tests.rs"]
mod tests;
