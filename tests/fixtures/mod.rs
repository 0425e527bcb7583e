// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for metal-provider-core
//!
//! In-memory collaborators and deterministic scenario data. Every resource a
//! test needs is built here; tests tweak the returned values instead of
//! constructing resources from scratch.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use metal_provider_core::apis::{
    CloudControllerManagerConfig, CloudProfileConfig, ControlPlaneConfig, Firewall, IamConfig,
    IdmConfig, InfrastructureConfig, IssuerConfig, MachineImage, MachineImages,
    NamespaceGroupConfig,
};
use metal_provider_core::certificates::{CertificateDescriptor, PkiIssuer};
use metal_provider_core::client::{
    ChartApplier, ClientError, SecretData, SecretReader, WorkloadClusterApi,
};
use metal_provider_core::cluster::{
    CloudProfile, Cluster, ControlPlane, IntOrString, MachineImageRef, Networking,
    SecretReference, Shoot, Worker, WorkerPool, CLUSTER_NAME_ANNOTATION,
    CLUSTER_TENANT_ANNOTATION,
};
use metal_provider_core::config::{
    AccountingConfig, AuthConfig, ControllerConfig, InventoryConfig, InventoryCredentials,
    API_HMAC_KEY, API_KEY_KEY, API_URL_KEY,
};
use metal_provider_core::inventory::{
    InventoryClient, InventoryConnector, InventoryError, InventoryNetwork, InventoryProject,
    NetworkQuery,
};
use metal_provider_core::scheme::ConfigScheme;

pub const NAMESPACE: &str = "shoot--foo--bar";
pub const PROJECT_ID: &str = "project1";
pub const PARTITION_ID: &str = "partition";
pub const NODE_CIDR: &str = "10.250.0.0/19";
pub const NETWORK_ID: &str = "my-net";
pub const CLUSTER_UID: &str = "cluster-uid";
pub const SINK_URL: &str = "http://localhost:8888/";
pub const SINK_HMAC: &str = "_dummy_";
pub const CLOUD_PROVIDER_SECRET: &str = "cloudprovider";

/// Inventory serving a fixed set of networks and projects, counting calls
#[derive(Default)]
pub struct FakeInventory {
    pub networks: Vec<InventoryNetwork>,
    pub projects: BTreeMap<String, InventoryProject>,
    pub unavailable: bool,
    pub find_calls: AtomicUsize,
    pub project_calls: AtomicUsize,
}

impl FakeInventory {
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn project_calls(&self) -> usize {
        self.project_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryClient for FakeInventory {
    async fn find_networks(
        &self,
        query: &NetworkQuery,
    ) -> Result<Vec<InventoryNetwork>, InventoryError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(InventoryError::Unavailable("connection refused".to_string()));
        }
        Ok(self
            .networks
            .iter()
            .filter(|n| {
                n.private_super || n.project_id == query.project_id || n.project_id.is_none()
            })
            .cloned()
            .collect())
    }

    async fn get_project(&self, project_id: &str) -> Result<InventoryProject, InventoryError> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(InventoryError::Unavailable("connection refused".to_string()));
        }
        self.projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| InventoryError::ProjectNotFound {
                project_id: project_id.to_string(),
            })
    }
}

/// Hands out the same fake inventory for any credentials
pub struct FakeConnector {
    pub inventory: Arc<FakeInventory>,
    pub seen: Mutex<Vec<InventoryCredentials>>,
}

impl FakeConnector {
    pub fn new(inventory: FakeInventory) -> Self {
        Self {
            inventory: Arc::new(inventory),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl InventoryConnector for FakeConnector {
    fn connect(
        &self,
        credentials: &InventoryCredentials,
    ) -> Result<Arc<dyn InventoryClient>, InventoryError> {
        self.seen.lock().unwrap().push(credentials.clone());
        let client: Arc<dyn InventoryClient> = self.inventory.clone();
        Ok(client)
    }
}

/// Namespaces and secrets of one cluster
#[derive(Default)]
pub struct MemoryCluster {
    pub namespaces: Mutex<BTreeSet<String>>,
    pub secrets: Mutex<BTreeMap<(String, String), SecretData>>,
    pub created_secrets: AtomicUsize,
}

impl MemoryCluster {
    pub fn with_secret(self, namespace: &str, name: &str, data: SecretData) -> Self {
        self.secrets
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()), data);
        self
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<SecretData> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }
}

#[async_trait]
impl SecretReader for MemoryCluster {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, ClientError> {
        self.secret(namespace, name).ok_or_else(|| ClientError::NotFound {
            kind: "secret",
            name: format!("{}/{}", namespace, name),
        })
    }
}

#[async_trait]
impl WorkloadClusterApi for MemoryCluster {
    async fn get_namespace(&self, name: &str) -> Result<(), ClientError> {
        if self.namespaces.lock().unwrap().contains(name) {
            Ok(())
        } else {
            Err(ClientError::NotFound {
                kind: "namespace",
                name: name.to_string(),
            })
        }
    }

    async fn create_namespace(&self, name: &str) -> Result<(), ClientError> {
        if !self.namespaces.lock().unwrap().insert(name.to_string()) {
            return Err(ClientError::AlreadyExists {
                kind: "namespace",
                name: name.to_string(),
            });
        }
        Ok(())
    }

    async fn create_secret(
        &self,
        namespace: &str,
        name: &str,
        data: SecretData,
    ) -> Result<(), ClientError> {
        self.created_secrets.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()), data);
        Ok(())
    }
}

/// PKI issuing deterministic material derived from the descriptor
#[derive(Default)]
pub struct FakePki {
    pub issued: Mutex<Vec<String>>,
}

#[async_trait]
impl PkiIssuer for FakePki {
    async fn issue(
        &self,
        descriptor: &CertificateDescriptor,
        ca: Option<&SecretData>,
    ) -> Result<SecretData, String> {
        self.issued.lock().unwrap().push(descriptor.name.clone());
        let mut data = BTreeMap::from([
            ("tls.crt".to_string(), format!("cert:{}", descriptor.common_name).into_bytes()),
            ("tls.key".to_string(), format!("key:{}", descriptor.name).into_bytes()),
        ]);
        if let Some(ca) = ca.and_then(|ca| ca.get("tls.crt")) {
            data.insert("ca.crt".to_string(), ca.clone());
        }
        Ok(data)
    }
}

/// Records every chart application
#[derive(Default)]
pub struct RecordingCharts {
    pub applied: Mutex<Vec<(String, String, String, Value)>>,
}

#[async_trait]
impl ChartApplier for RecordingCharts {
    async fn apply_chart(
        &self,
        chart: &str,
        namespace: &str,
        release: &str,
        values: Value,
    ) -> Result<(), ClientError> {
        self.applied.lock().unwrap().push((
            chart.to_string(),
            namespace.to_string(),
            release.to_string(),
            values,
        ));
        Ok(())
    }
}

pub fn scheme() -> Arc<ConfigScheme> {
    Arc::new(ConfigScheme::standard())
}

pub fn private_network(id: &str, prefixes: &[&str]) -> InventoryNetwork {
    InventoryNetwork {
        id: id.to_string(),
        project_id: Some(PROJECT_ID.to_string()),
        partition_id: Some(PARTITION_ID.to_string()),
        destination_prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
        private_super: false,
        underlay: false,
        parent_network_id: None,
    }
}

/// Inventory with one private network covering the node CIDR
pub fn inventory() -> FakeInventory {
    FakeInventory {
        networks: vec![private_network(NETWORK_ID, &["10.0.0.0/8"])],
        projects: BTreeMap::from([(
            PROJECT_ID.to_string(),
            InventoryProject {
                id: PROJECT_ID.to_string(),
                name: "project-name".to_string(),
                tenant_id: "tenant".to_string(),
            },
        )]),
        ..Default::default()
    }
}

pub fn credentials_secret() -> SecretData {
    BTreeMap::from([
        (API_URL_KEY.to_string(), b"http://localhost:8888/".to_vec()),
        (API_KEY_KEY.to_string(), b"abc".to_vec()),
        (API_HMAC_KEY.to_string(), b"cdf".to_vec()),
    ])
}

pub fn seed_cluster() -> MemoryCluster {
    MemoryCluster::default()
        .with_secret(NAMESPACE, CLOUD_PROVIDER_SECRET, credentials_secret())
        .with_secret(
            NAMESPACE,
            "limit-validating-webhook-server",
            BTreeMap::from([("ca.crt".to_string(), b"my-ca".to_vec())]),
        )
}

pub fn iam_config() -> IamConfig {
    IamConfig {
        issuer_config: Some(IssuerConfig {
            url: Some("http://dex/".to_string()),
            client_id: Some("auth-go-cli".to_string()),
        }),
        idm_config: Some(IdmConfig {
            idm_type: Some("UX".to_string()),
            connector_config: None,
        }),
        group_config: Some(NamespaceGroupConfig {
            namespace_max_length: Some(20),
            ..Default::default()
        }),
    }
}

pub fn infrastructure_config() -> InfrastructureConfig {
    InfrastructureConfig {
        firewall: Firewall {
            size: "c1-xlarge-x86".to_string(),
            image: "firewall-1".to_string(),
            networks: vec!["internet-nbg-w8101".to_string()],
        },
        partition_id: PARTITION_ID.to_string(),
        project_id: PROJECT_ID.to_string(),
    }
}

pub fn control_plane_config() -> ControlPlaneConfig {
    ControlPlaneConfig {
        cloud_controller_manager: Some(CloudControllerManagerConfig {
            feature_gates: Some(BTreeMap::from([(
                "CustomResourceValidation".to_string(),
                true,
            )])),
        }),
        iam_config: Some(iam_config()),
    }
}

pub fn cluster() -> Cluster {
    let scheme = ConfigScheme::standard();
    Cluster {
        cloud_profile: Some(CloudProfile {
            name: "metal".to_string(),
            provider_config: Some(
                scheme
                    .encode(&CloudProfileConfig {
                        iam_config: Some(iam_config()),
                    })
                    .unwrap(),
            ),
        }),
        shoot: Shoot {
            name: "bar".to_string(),
            uid: CLUSTER_UID.to_string(),
            technical_id: NAMESPACE.to_string(),
            annotations: BTreeMap::from([
                (CLUSTER_NAME_ANNOTATION.to_string(), "bar".to_string()),
                (CLUSTER_TENANT_ANNOTATION.to_string(), "foo".to_string()),
            ]),
            kubernetes_version: "1.13.4".to_string(),
            region: "eu-west-1".to_string(),
            networking: Networking {
                nodes: Some(NODE_CIDR.to_string()),
                pods: Some("10.244.128.0/18".to_string()),
                services: Some("10.244.192.0/18".to_string()),
            },
            infrastructure_config: Some(scheme.encode(&infrastructure_config()).unwrap()),
            hibernated: false,
        },
    }
}

pub fn secret_ref() -> SecretReference {
    SecretReference {
        name: CLOUD_PROVIDER_SECRET.to_string(),
        namespace: NAMESPACE.to_string(),
    }
}

pub fn control_plane() -> ControlPlane {
    ControlPlane {
        name: "control-plane".to_string(),
        namespace: NAMESPACE.to_string(),
        provider_config: Some(
            ConfigScheme::standard()
                .encode(&control_plane_config())
                .unwrap(),
        ),
        secret_ref: secret_ref(),
    }
}

pub fn checksums() -> BTreeMap<String, String> {
    [
        (
            "cloudprovider",
            "8bafb35ff1ac60275d62e1cbd495aceb511fb354f74a20f7d06ecb48b3a68432",
        ),
        (
            "cloud-provider-config",
            "08a7bc7fe8f59b055f173145e211760a83f02cf89635cef26ebb351378635606",
        ),
        (
            "cloud-controller-manager",
            "3d791b164a808638da9a8df03924be2a41e34cd664e42231c00fe369e3588272",
        ),
        (
            "cloud-controller-manager-server",
            "6dff2a2e6f14444b66d8e4a351c049f7e89ee24ba3eaab95dbec40ba6bdebb52",
        ),
    ]
    .into_iter()
    .map(|(name, sum)| (name.to_string(), sum.to_string()))
    .collect()
}

pub fn controller_config() -> ControllerConfig {
    ControllerConfig {
        accounting: AccountingConfig {
            accounting_sink_url: SINK_URL.to_string(),
            accounting_sink_hmac: SINK_HMAC.to_string(),
        },
        auth: AuthConfig {
            provider_tenant: "provider".to_string(),
        },
        machine_images: machine_images(),
        inventory: InventoryConfig::default(),
    }
}

pub fn machine_images() -> MachineImages {
    MachineImages {
        machine_images: vec![MachineImage {
            name: "my-os".to_string(),
            version: "123".to_string(),
            image: "my-os-123".to_string(),
        }],
    }
}

pub fn pool() -> WorkerPool {
    WorkerPool {
        name: "pool-1".to_string(),
        machine_type: "large".to_string(),
        machine_image: MachineImageRef {
            name: "my-os".to_string(),
            version: "123".to_string(),
        },
        minimum: 5,
        maximum: 10,
        max_surge: IntOrString::Int(3),
        max_unavailable: IntOrString::Int(2),
        labels: BTreeMap::from([("k1".to_string(), "v1".to_string())]),
        annotations: BTreeMap::new(),
        taints: Vec::new(),
        user_data: b"some-data".to_vec(),
    }
}

pub fn worker() -> Worker {
    Worker {
        namespace: NAMESPACE.to_string(),
        region: "eu-west-1".to_string(),
        ssh_public_key: b"ssh-rsa AAAA".to_vec(),
        secret_ref: secret_ref(),
        pools: vec![pool()],
    }
}
