// Copyright (c) 2025 - Cowboy AI, Inc.
//! Machine classes and machine deployments

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{pool_hash, PlanError};
use crate::apis::{InfrastructureConfig, MachineImage, MachineImages};
use crate::client::{read_inventory_credentials, ChartApplier, SecretReader};
use crate::cluster::{
    Cluster, IntOrString, Taint, Worker, CLUSTER_ID_TAG, CLUSTER_NAME_TAG, CLUSTER_PROJECT_TAG,
};
use crate::config::InventoryCredentials;
use crate::errors::ProviderResult;
use crate::inventory::{InventoryConnector, InventoryResolver, TieBreak};
use crate::scheme::{infrastructure_config_from_cluster, ConfigScheme};

/// Kind of the machine classes this provider emits
pub const MACHINE_CLASS_KIND: &str = "MetalMachineClass";

/// Chart and release name of the machine class chart
pub const MACHINE_CLASS_CHART: &str = "machineclass";

const GARDEN_PURPOSE_LABEL: &str = "garden.sapcloud.io/purpose";
const GARDEN_PURPOSE_MACHINE_CLASS: &str = "machineclass";

/// Secret embedded in a machine class
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineClassSecret {
    #[serde(rename = "cloudConfig")]
    pub cloud_config: String,
    #[serde(rename = "metalAPIURL")]
    pub api_url: String,
    #[serde(rename = "metalAPIKey")]
    pub api_key: String,
    #[serde(rename = "metalAPIHMac")]
    pub api_hmac: String,
}

impl std::fmt::Debug for MachineClassSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineClassSecret")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// One flattened machine class record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineClassSpec {
    pub name: String,
    pub partition: String,
    pub size: String,
    pub project: String,
    pub network: String,
    pub image: String,
    pub tags: Vec<String>,
    pub sshkeys: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub secret: MachineClassSecret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDeployment {
    pub name: String,
    pub class_name: String,
    pub secret_name: String,
    pub minimum: i32,
    pub maximum: i32,
    pub max_surge: IntOrString,
    pub max_unavailable: IntOrString,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub taints: Vec<Taint>,
}

/// Planned machines of one worker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachinePlan {
    pub classes: Vec<MachineClassSpec>,
    pub deployments: Vec<MachineDeployment>,
    /// Images in use, each listed once
    pub machine_images: Vec<MachineImage>,
}

/// Pure planning step; all lookups have already happened
pub struct MachinePlanner<'a> {
    pub worker: &'a Worker,
    pub cluster: &'a Cluster,
    pub infrastructure: &'a InfrastructureConfig,
    pub network_id: &'a str,
    pub credentials: &'a InventoryCredentials,
    pub images: &'a MachineImages,
}

impl MachinePlanner<'_> {
    pub fn plan(&self) -> Result<MachinePlan, PlanError> {
        let mut plan = MachinePlan::default();

        for pool in &self.worker.pools {
            let hash = pool_hash(pool, self.cluster)?;

            let image = self
                .images
                .find(&pool.machine_image.name, &pool.machine_image.version)
                .ok_or_else(|| PlanError::ImageNotFound {
                    pool: pool.name.clone(),
                    name: pool.machine_image.name.clone(),
                    version: pool.machine_image.version.clone(),
                })?;
            if !plan.machine_images.contains(image) {
                plan.machine_images.push(image.clone());
            }

            let deployment_name = format!("{}-{}", self.worker.namespace, pool.name);
            let class_name = format!("{}-{}", deployment_name, hash);
            debug!("Planned machine class {} for pool {}", class_name, pool.name);

            plan.classes.push(MachineClassSpec {
                name: class_name.clone(),
                partition: self.infrastructure.partition_id.clone(),
                size: pool.machine_type.clone(),
                project: self.infrastructure.project_id.clone(),
                network: self.network_id.to_string(),
                image: image.image.clone(),
                tags: self.tags(&pool.machine_type),
                sshkeys: vec![String::from_utf8_lossy(&self.worker.ssh_public_key).into_owned()],
                labels: BTreeMap::from([(
                    GARDEN_PURPOSE_LABEL.to_string(),
                    GARDEN_PURPOSE_MACHINE_CLASS.to_string(),
                )]),
                secret: MachineClassSecret {
                    cloud_config: String::from_utf8_lossy(&pool.user_data).into_owned(),
                    api_url: self.credentials.api_url.clone(),
                    api_key: self.credentials.api_key.clone(),
                    api_hmac: self.credentials.api_hmac.clone(),
                },
            });

            plan.deployments.push(MachineDeployment {
                name: deployment_name,
                class_name: class_name.clone(),
                secret_name: class_name,
                minimum: pool.minimum,
                maximum: pool.maximum,
                max_surge: pool.max_surge.clone(),
                max_unavailable: pool.max_unavailable.clone(),
                labels: pool.labels.clone(),
                annotations: pool.annotations.clone(),
                taints: pool.taints.clone(),
            });
        }

        Ok(plan)
    }

    fn tags(&self, machine_type: &str) -> Vec<String> {
        let namespace = &self.worker.namespace;
        vec![
            format!("kubernetes.io/cluster={}", namespace),
            "kubernetes.io/role=node".to_string(),
            format!("node.kubernetes.io/instance-type={}", machine_type),
            format!("topology.kubernetes.io/region={}", self.worker.region),
            format!("topology.kubernetes.io/zone={}", self.infrastructure.partition_id),
            format!("{}={}", CLUSTER_ID_TAG, self.cluster.shoot.uid),
            format!("{}={}", CLUSTER_NAME_TAG, namespace),
            format!("{}={}", CLUSTER_PROJECT_TAG, self.infrastructure.project_id),
        ]
    }
}

/// Worker reconciliation for one request.
///
/// The plan is computed on first use and shared by both entry points, so the
/// inventory is queried once per delegate.
pub struct WorkerDelegate {
    scheme: Arc<ConfigScheme>,
    secrets: Arc<dyn SecretReader>,
    connector: Arc<dyn InventoryConnector>,
    images: MachineImages,
    worker: Worker,
    cluster: Cluster,
    tie_break: TieBreak,
    plan: OnceCell<MachinePlan>,
}

impl WorkerDelegate {
    pub fn new(
        scheme: Arc<ConfigScheme>,
        secrets: Arc<dyn SecretReader>,
        connector: Arc<dyn InventoryConnector>,
        images: MachineImages,
        worker: Worker,
        cluster: Cluster,
    ) -> Self {
        Self {
            scheme,
            secrets,
            connector,
            images,
            worker,
            cluster,
            tie_break: TieBreak::default(),
            plan: OnceCell::new(),
        }
    }

    /// How the private network is picked when several cover the node CIDR
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn machine_class_kind(&self) -> &'static str {
        MACHINE_CLASS_KIND
    }

    /// Apply the machine class chart to the worker namespace
    pub async fn deploy_machine_classes(&self, charts: &dyn ChartApplier) -> ProviderResult<()> {
        let plan = self.plan().await?;
        let values = json!({ "machineClasses": plan.classes });
        charts
            .apply_chart(
                MACHINE_CLASS_CHART,
                &self.worker.namespace,
                MACHINE_CLASS_CHART,
                values,
            )
            .await?;
        info!(
            "Deployed {} machine classes to {}",
            plan.classes.len(),
            self.worker.namespace
        );
        Ok(())
    }

    pub async fn generate_machine_deployments(&self) -> ProviderResult<Vec<MachineDeployment>> {
        Ok(self.plan().await?.deployments.clone())
    }

    /// Images used by the worker's pools
    pub async fn machine_images(&self) -> ProviderResult<Vec<MachineImage>> {
        Ok(self.plan().await?.machine_images.clone())
    }

    pub async fn plan(&self) -> ProviderResult<&MachinePlan> {
        self.plan.get_or_try_init(|| self.compute_plan()).await
    }

    async fn compute_plan(&self) -> ProviderResult<MachinePlan> {
        let infrastructure = infrastructure_config_from_cluster(&self.scheme, &self.cluster)?;
        let node_cidr = self
            .cluster
            .shoot
            .networking
            .nodes
            .as_deref()
            .ok_or(PlanError::MissingNodeCidr)?;

        let credentials =
            read_inventory_credentials(self.secrets.as_ref(), &self.worker.secret_ref).await?;
        let inventory = self.connector.connect(&credentials)?;
        let network = InventoryResolver::new(inventory.as_ref())
            .with_tie_break(self.tie_break)
            .resolve_private_network(&infrastructure.project_id, node_cidr)
            .await?;

        let plan = MachinePlanner {
            worker: &self.worker,
            cluster: &self.cluster,
            infrastructure: &infrastructure,
            network_id: &network.id,
            credentials: &credentials,
            images: &self.images,
        }
        .plan()?;

        info!(
            "Planned {} machine deployments for {}",
            plan.deployments.len(),
            self.worker.namespace
        );
        Ok(plan)
    }
}
