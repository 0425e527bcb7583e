// Copyright (c) 2025 - Cowboy AI, Inc.
//! Value producers and the composer that runs them
//!
//! Each producer sees the same read-only [`CompositionContext`] and none sees
//! another's output. The composer awaits them one after another and stops at
//! the first failure.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    AccountingValues, AuthnValues, ComposedValues, ComposerError, ControllerManagerValues,
    LimitWebhookValues, PodAnnotations, ValueGroup, ValueNamespace, ValuesError,
};
use crate::apis::{ControlPlaneConfig, IamConfig, InfrastructureConfig};
use crate::cluster::{Cluster, CLUSTER_NAME_ANNOTATION, CLUSTER_TENANT_ANNOTATION};
use crate::config::{AccountingConfig, AuthConfig};
use crate::inventory::{InventoryClient, InventoryResolver, TieBreak};

/// Checksum map key of the controller manager kubeconfig secret
pub const CHECKSUM_CLOUD_CONTROLLER_MANAGER: &str = "cloud-controller-manager";

/// Checksum map key of the controller manager serving certificate
pub const CHECKSUM_CLOUD_CONTROLLER_MANAGER_SERVER: &str = "cloud-controller-manager-server";

/// Checksum map key of the cloud provider credentials
pub const CHECKSUM_CLOUD_PROVIDER: &str = "cloudprovider";

/// Checksum map key of the cloud provider config map
pub const CHECKSUM_CLOUD_PROVIDER_CONFIG: &str = "cloud-provider-config";

/// Lower bound applied to a scaled-down control plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplicaFloor {
    #[default]
    None,
    One,
}

/// Scale state of the control plane for one reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scaling {
    pub scaled_down: bool,
    pub floor: ReplicaFloor,
}

impl Scaling {
    pub fn new(scaled_down: bool) -> Self {
        Self {
            scaled_down,
            floor: ReplicaFloor::None,
        }
    }

    pub fn with_floor(mut self, floor: ReplicaFloor) -> Self {
        self.floor = floor;
        self
    }
}

/// Replica count of a control-plane component.
///
/// A hibernated cluster counts as scaled down.
pub fn control_plane_replicas(cluster: &Cluster, scaling: Scaling, requested: u32) -> u32 {
    if !(scaling.scaled_down || cluster.is_hibernated()) {
        return requested;
    }
    match scaling.floor {
        ReplicaFloor::One => 1,
        ReplicaFloor::None => 0,
    }
}

/// Everything a producer may read
pub struct CompositionContext<'a> {
    pub cluster: &'a Cluster,
    pub infrastructure: &'a InfrastructureConfig,
    /// Control-plane config whose IAM section is already merged
    pub control_plane: &'a ControlPlaneConfig,
    pub checksums: &'a BTreeMap<String, String>,
    pub scaling: Scaling,
    pub inventory: &'a dyn InventoryClient,
}

impl CompositionContext<'_> {
    fn iam(&self) -> Option<&IamConfig> {
        self.control_plane.iam_config.as_ref()
    }

    fn annotation(&self, key: &str) -> String {
        self.cluster.shoot.annotation(key).to_string()
    }
}

/// One independent source of chart values
#[async_trait]
pub trait ValueProducer: Send + Sync {
    /// The namespace whose keys this producer writes
    fn namespace(&self) -> ValueNamespace;

    async fn produce(&self, ctx: &CompositionContext<'_>) -> Result<ValueGroup, ValuesError>;
}

/// Cloud controller manager values
#[derive(Debug, Clone, Default)]
pub struct ControllerManagerProducer {
    tie_break: TieBreak,
}

impl ControllerManagerProducer {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }
}

#[async_trait]
impl ValueProducer for ControllerManagerProducer {
    fn namespace(&self) -> ValueNamespace {
        ValueNamespace::ControllerManager
    }

    async fn produce(&self, ctx: &CompositionContext<'_>) -> Result<ValueGroup, ValuesError> {
        let node_cidr = ctx
            .cluster
            .shoot
            .networking
            .nodes
            .as_deref()
            .ok_or(ValuesError::MissingNodeCidr)?;

        let project_id = &ctx.infrastructure.project_id;
        let network = InventoryResolver::new(ctx.inventory)
            .with_tie_break(self.tie_break)
            .resolve_private_network(project_id, node_cidr)
            .await?;

        let checksum = |key: &str| ctx.checksums.get(key).cloned().unwrap_or_default();

        Ok(ValueGroup::ControllerManager(ControllerManagerValues {
            replicas: control_plane_replicas(ctx.cluster, ctx.scaling, 1),
            project_id: project_id.clone(),
            cluster_id: ctx.cluster.shoot.uid.clone(),
            partition_id: ctx.infrastructure.partition_id.clone(),
            network_id: network.id,
            kubernetes_version: ctx.cluster.shoot.kubernetes_version.clone(),
            pod_network: ctx.cluster.pod_network().to_string(),
            pod_annotations: PodAnnotations {
                cloud_controller_manager: checksum(CHECKSUM_CLOUD_CONTROLLER_MANAGER),
                cloud_controller_manager_server: checksum(CHECKSUM_CLOUD_CONTROLLER_MANAGER_SERVER),
                cloud_provider: checksum(CHECKSUM_CLOUD_PROVIDER),
                cloud_provider_config: checksum(CHECKSUM_CLOUD_PROVIDER_CONFIG),
            },
            feature_gates: ctx
                .control_plane
                .cloud_controller_manager
                .as_ref()
                .and_then(|ccm| ccm.feature_gates.clone()),
        }))
    }
}

/// Authentication webhook and group rolebinding controller values
#[derive(Debug, Clone, Default)]
pub struct AuthnProducer {
    auth: AuthConfig,
}

impl AuthnProducer {
    pub fn new(auth: AuthConfig) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl ValueProducer for AuthnProducer {
    fn namespace(&self) -> ValueNamespace {
        ValueNamespace::Authn
    }

    async fn produce(&self, ctx: &CompositionContext<'_>) -> Result<ValueGroup, ValuesError> {
        let issuer = ctx.iam().and_then(|iam| iam.issuer_config.as_ref());
        let url = issuer
            .and_then(|i| i.url.clone())
            .ok_or(ValuesError::MissingIamField("issuerConfig.url"))?;
        let client_id = issuer
            .and_then(|i| i.client_id.clone())
            .ok_or(ValuesError::MissingIamField("issuerConfig.clientId"))?;

        Ok(ValueGroup::Authn(AuthnValues {
            tenant: ctx.annotation(CLUSTER_TENANT_ANNOTATION),
            cluster_name: ctx.annotation(CLUSTER_NAME_ANNOTATION),
            oidc_issuer_url: url,
            oidc_issuer_client_id: client_id,
            debug: true,
            provider_tenant: self.auth.provider_tenant.clone(),
        }))
    }
}

/// Accounting exporter values
#[derive(Debug, Clone, Default)]
pub struct AccountingProducer {
    accounting: AccountingConfig,
}

impl AccountingProducer {
    pub fn new(accounting: AccountingConfig) -> Self {
        Self { accounting }
    }
}

#[async_trait]
impl ValueProducer for AccountingProducer {
    fn namespace(&self) -> ValueNamespace {
        ValueNamespace::Accounting
    }

    async fn produce(&self, ctx: &CompositionContext<'_>) -> Result<ValueGroup, ValuesError> {
        let project_id = &ctx.infrastructure.project_id;
        let project = InventoryResolver::new(ctx.inventory)
            .resolve_project(project_id)
            .await?;

        Ok(ValueGroup::Accounting(AccountingValues {
            partition_id: ctx.infrastructure.partition_id.clone(),
            tenant: ctx.annotation(CLUSTER_TENANT_ANNOTATION),
            project_name: project.name,
            project_id: project_id.clone(),
            cluster_name: ctx.annotation(CLUSTER_NAME_ANNOTATION),
            cluster_id: ctx.cluster.shoot.uid.clone(),
            sink_url: self.accounting.accounting_sink_url.clone(),
            sink_hmac: self.accounting.accounting_sink_hmac.clone(),
        }))
    }
}

/// Limit validating webhook values; validation is off unless overridden
#[derive(Debug, Clone, Default)]
pub struct LimitWebhookProducer {
    validate: bool,
}

impl LimitWebhookProducer {
    pub fn new(validate: bool) -> Self {
        Self { validate }
    }
}

#[async_trait]
impl ValueProducer for LimitWebhookProducer {
    fn namespace(&self) -> ValueNamespace {
        ValueNamespace::LimitWebhook
    }

    async fn produce(&self, _ctx: &CompositionContext<'_>) -> Result<ValueGroup, ValuesError> {
        Ok(ValueGroup::LimitWebhook(LimitWebhookValues {
            validate: self.validate,
        }))
    }
}

/// Runs a fixed set of producers and accumulates their groups
#[derive(Clone)]
pub struct ValueComposer {
    producers: Vec<Arc<dyn ValueProducer>>,
}

impl std::fmt::Debug for ValueComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let namespaces: Vec<ValueNamespace> =
            self.producers.iter().map(|p| p.namespace()).collect();
        f.debug_struct("ValueComposer")
            .field("producers", &namespaces)
            .finish()
    }
}

impl ValueComposer {
    pub fn empty() -> Self {
        Self {
            producers: Vec::new(),
        }
    }

    /// The four control-plane producers
    pub fn standard(accounting: AccountingConfig, auth: AuthConfig) -> Self {
        Self::empty()
            .with_producer(ControllerManagerProducer::default())
            .with_producer(AuthnProducer::new(auth))
            .with_producer(AccountingProducer::new(accounting))
            .with_producer(LimitWebhookProducer::default())
    }

    /// Add a producer, replacing any producer of the same namespace
    pub fn with_producer<P: ValueProducer + 'static>(mut self, producer: P) -> Self {
        let namespace = producer.namespace();
        let producer: Arc<dyn ValueProducer> = Arc::new(producer);
        match self.producers.iter().position(|p| p.namespace() == namespace) {
            Some(index) => self.producers[index] = producer,
            None => self.producers.push(producer),
        }
        self
    }

    pub fn namespaces(&self) -> Vec<ValueNamespace> {
        self.producers.iter().map(|p| p.namespace()).collect()
    }

    pub async fn compose(
        &self,
        ctx: &CompositionContext<'_>,
    ) -> Result<ComposedValues, ComposerError> {
        let mut groups = Vec::with_capacity(self.producers.len());
        for producer in &self.producers {
            let namespace = producer.namespace();
            debug!("Producing {} values", namespace);
            let group = producer
                .produce(ctx)
                .await
                .map_err(|source| ComposerError::Producer { namespace, source })?;
            groups.push(group);
        }

        let values = ComposedValues::from_groups(groups)?;
        info!(
            "Composed {} values for cluster {}",
            values.len(),
            ctx.cluster.shoot.technical_id
        );
        Ok(values)
    }
}
