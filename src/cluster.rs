// Copyright (c) 2025 - Cowboy AI, Inc.
//! Read-only input resources
//!
//! The reconciler hands these in per request. Each carries an opaque
//! provider-config payload next to a few well-known scalar fields.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Annotation holding the human-readable cluster name
pub const CLUSTER_NAME_ANNOTATION: &str = "cluster.metal-pod.io/name";

/// Annotation holding the owning tenant
pub const CLUSTER_TENANT_ANNOTATION: &str = "cluster.metal-pod.io/tenant";

/// Machine tag key for the cluster UID
pub const CLUSTER_ID_TAG: &str = "cluster.metal-pod.io/id";

/// Machine tag key for the cluster name
pub const CLUSTER_NAME_TAG: &str = "cluster.metal-pod.io/name";

/// Machine tag key for the inventory project
pub const CLUSTER_PROJECT_TAG: &str = "machine.metal-pod.io/project-id";

/// Reference to a secret holding inventory credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretReference {
    pub name: String,
    pub namespace: String,
}

impl fmt::Display for SecretReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudProfile {
    pub name: String,
    #[serde(default)]
    pub provider_config: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Networking {
    #[serde(default)]
    pub nodes: Option<String>,
    #[serde(default)]
    pub pods: Option<String>,
    #[serde(default)]
    pub services: Option<String>,
}

/// The workload cluster description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shoot {
    pub name: String,
    pub uid: String,
    /// Namespace of the cluster's control plane in the hosting cluster
    pub technical_id: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    pub kubernetes_version: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub networking: Networking,
    #[serde(default)]
    pub infrastructure_config: Option<Vec<u8>>,
    #[serde(default)]
    pub hibernated: bool,
}

impl Shoot {
    pub fn annotation(&self, key: &str) -> &str {
        self.annotations.get(key).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default)]
    pub cloud_profile: Option<CloudProfile>,
    pub shoot: Shoot,
}

impl Cluster {
    pub fn is_hibernated(&self) -> bool {
        self.shoot.hibernated
    }

    /// Pod network CIDR, empty when not yet assigned
    pub fn pod_network(&self) -> &str {
        self.shoot.networking.pods.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlane {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub provider_config: Option<Vec<u8>>,
    pub secret_ref: SecretReference,
}

/// Integer or percentage, as used for rollout bounds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntOrString {
    Int(i32),
    String(String),
}

impl Default for IntOrString {
    fn default() -> Self {
        IntOrString::Int(0)
    }
}

impl fmt::Display for IntOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntOrString::Int(value) => write!(f, "{}", value),
            IntOrString::String(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub effect: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineImageRef {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPool {
    pub name: String,
    pub machine_type: String,
    pub machine_image: MachineImageRef,
    pub minimum: i32,
    pub maximum: i32,
    #[serde(default)]
    pub max_surge: IntOrString,
    #[serde(default)]
    pub max_unavailable: IntOrString,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub taints: Vec<Taint>,
    #[serde(default)]
    pub user_data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub namespace: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub ssh_public_key: Vec<u8>,
    pub secret_ref: SecretReference,
    #[serde(default)]
    pub pools: Vec<WorkerPool>,
}
