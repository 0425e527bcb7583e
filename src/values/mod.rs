// Copyright (c) 2025 - Cowboy AI, Inc.
//! Value composition
//!
//! Chart values are produced by independent producers and merged into one
//! flat bag for the templating collaborator. Internally the bag is typed:
//!
//! - every key is a [`ValueKey`] variant and belongs to exactly one
//!   [`ValueNamespace`] (an exhaustive `match`, so a new key cannot be added
//!   without naming its owner)
//! - every producer returns one [`ValueGroup`] variant
//! - [`ValueAccumulator`] rejects a group that writes a key outside its
//!   namespace, a second group for the same namespace, and any repeated key
//!
//! The untyped map only exists at the boundary, in
//! [`ComposedValues::to_map`]. Because namespaces are disjoint the insertion
//! order of groups never changes the result.
//!
//! ```text
//! ControllerManager ─┐
//! Authn ─────────────┤
//! Accounting ────────┼──> ValueAccumulator ──> ComposedValues ──> JSON map
//! LimitWebhook ──────┘
//! ```

pub mod producers;
pub mod provider;

pub use producers::{
    control_plane_replicas, AccountingProducer, AuthnProducer, CompositionContext,
    ControllerManagerProducer, LimitWebhookProducer, ReplicaFloor, Scaling, ValueComposer,
    ValueProducer,
};
pub use provider::ControlPlaneValuesProvider;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::inventory::InventoryError;

/// Failure inside a single producer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValuesError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("nodeCIDR was not yet set by infrastructure controller")]
    MissingNodeCidr,

    #[error("merged IAM config has no {0}")]
    MissingIamField(&'static str),
}

/// Composition failures; no partial output accompanies any of them
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComposerError {
    #[error("{namespace} values could not be produced: {source}")]
    Producer {
        namespace: ValueNamespace,
        #[source]
        source: ValuesError,
    },

    #[error("{namespace} values wrote key {key} owned by {owner}")]
    ForeignKey {
        namespace: ValueNamespace,
        owner: ValueNamespace,
        key: &'static str,
    },

    #[error("key {key} written twice")]
    KeyCollision { key: &'static str },

    #[error("{0} values composed twice")]
    DuplicateNamespace(ValueNamespace),
}

/// Owner of a disjoint slice of the key space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueNamespace {
    ControllerManager,
    Authn,
    Accounting,
    LimitWebhook,
    AuthnWebhookConfig,
    ShootLimitWebhook,
}

impl fmt::Display for ValueNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueNamespace::ControllerManager => "cloud-controller-manager",
            ValueNamespace::Authn => "authn",
            ValueNamespace::Accounting => "accounting-exporter",
            ValueNamespace::LimitWebhook => "limit-validating-webhook",
            ValueNamespace::AuthnWebhookConfig => "authn-webhook-config",
            ValueNamespace::ShootLimitWebhook => "shoot-limit-validating-webhook",
        };
        write!(f, "{}", name)
    }
}

/// Every key the templating collaborator understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    Replicas,
    ProjectId,
    ClusterId,
    PartitionId,
    NetworkId,
    KubernetesVersion,
    PodNetwork,
    PodAnnotations,
    FeatureGates,

    AuthnTenant,
    AuthnClusterName,
    AuthnOidcIssuerUrl,
    AuthnOidcIssuerClientId,
    AuthnDebug,
    AuthnProviderTenant,
    GroupRolebindingClusterName,

    AccountingPartitionId,
    AccountingTenant,
    AccountingProjectName,
    AccountingProjectId,
    AccountingClusterName,
    AccountingClusterId,
    AccountingSinkUrl,
    AccountingSinkHmac,

    LimitWebhookValidate,

    AuthnWebhookUrl,

    ShootLimitWebhookUrl,
    ShootLimitWebhookCaBundle,
}

impl ValueKey {
    pub const ALL: [ValueKey; 28] = [
        ValueKey::Replicas,
        ValueKey::ProjectId,
        ValueKey::ClusterId,
        ValueKey::PartitionId,
        ValueKey::NetworkId,
        ValueKey::KubernetesVersion,
        ValueKey::PodNetwork,
        ValueKey::PodAnnotations,
        ValueKey::FeatureGates,
        ValueKey::AuthnTenant,
        ValueKey::AuthnClusterName,
        ValueKey::AuthnOidcIssuerUrl,
        ValueKey::AuthnOidcIssuerClientId,
        ValueKey::AuthnDebug,
        ValueKey::AuthnProviderTenant,
        ValueKey::GroupRolebindingClusterName,
        ValueKey::AccountingPartitionId,
        ValueKey::AccountingTenant,
        ValueKey::AccountingProjectName,
        ValueKey::AccountingProjectId,
        ValueKey::AccountingClusterName,
        ValueKey::AccountingClusterId,
        ValueKey::AccountingSinkUrl,
        ValueKey::AccountingSinkHmac,
        ValueKey::LimitWebhookValidate,
        ValueKey::AuthnWebhookUrl,
        ValueKey::ShootLimitWebhookUrl,
        ValueKey::ShootLimitWebhookCaBundle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKey::Replicas => "replicas",
            ValueKey::ProjectId => "projectID",
            ValueKey::ClusterId => "clusterID",
            ValueKey::PartitionId => "partitionID",
            ValueKey::NetworkId => "networkID",
            ValueKey::KubernetesVersion => "kubernetesVersion",
            ValueKey::PodNetwork => "podNetwork",
            ValueKey::PodAnnotations => "podAnnotations",
            ValueKey::FeatureGates => "featureGates",
            ValueKey::AuthnTenant => "authn_tenant",
            ValueKey::AuthnClusterName => "authn_clustername",
            ValueKey::AuthnOidcIssuerUrl => "authn_oidcIssuerUrl",
            ValueKey::AuthnOidcIssuerClientId => "authn_oidcIssuerClientId",
            ValueKey::AuthnDebug => "authn_debug",
            ValueKey::AuthnProviderTenant => "authn_providerTenant",
            ValueKey::GroupRolebindingClusterName => "grprb_clustername",
            ValueKey::AccountingPartitionId => "accex_partitionID",
            ValueKey::AccountingTenant => "accex_tenant",
            ValueKey::AccountingProjectName => "accex_projectname",
            ValueKey::AccountingProjectId => "accex_projectID",
            ValueKey::AccountingClusterName => "accex_clustername",
            ValueKey::AccountingClusterId => "accex_clusterID",
            ValueKey::AccountingSinkUrl => "accex_accountingsink_url",
            ValueKey::AccountingSinkHmac => "accex_accountingsink_HMAC",
            ValueKey::LimitWebhookValidate => "lvw_validate",
            ValueKey::AuthnWebhookUrl => "authnWebhook_url",
            ValueKey::ShootLimitWebhookUrl => "limitValidatingWebhook_url",
            ValueKey::ShootLimitWebhookCaBundle => "limitValidatingWebhook_caBundle",
        }
    }

    pub fn namespace(&self) -> ValueNamespace {
        match self {
            ValueKey::Replicas
            | ValueKey::ProjectId
            | ValueKey::ClusterId
            | ValueKey::PartitionId
            | ValueKey::NetworkId
            | ValueKey::KubernetesVersion
            | ValueKey::PodNetwork
            | ValueKey::PodAnnotations
            | ValueKey::FeatureGates => ValueNamespace::ControllerManager,
            ValueKey::AuthnTenant
            | ValueKey::AuthnClusterName
            | ValueKey::AuthnOidcIssuerUrl
            | ValueKey::AuthnOidcIssuerClientId
            | ValueKey::AuthnDebug
            | ValueKey::AuthnProviderTenant
            | ValueKey::GroupRolebindingClusterName => ValueNamespace::Authn,
            ValueKey::AccountingPartitionId
            | ValueKey::AccountingTenant
            | ValueKey::AccountingProjectName
            | ValueKey::AccountingProjectId
            | ValueKey::AccountingClusterName
            | ValueKey::AccountingClusterId
            | ValueKey::AccountingSinkUrl
            | ValueKey::AccountingSinkHmac => ValueNamespace::Accounting,
            ValueKey::LimitWebhookValidate => ValueNamespace::LimitWebhook,
            ValueKey::AuthnWebhookUrl => ValueNamespace::AuthnWebhookConfig,
            ValueKey::ShootLimitWebhookUrl | ValueKey::ShootLimitWebhookCaBundle => {
                ValueNamespace::ShootLimitWebhook
            }
        }
    }
}

impl fmt::Display for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checksums of the secrets the controller manager pod mounts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodAnnotations {
    pub cloud_controller_manager: String,
    pub cloud_controller_manager_server: String,
    pub cloud_provider: String,
    pub cloud_provider_config: String,
}

impl PodAnnotations {
    fn to_value(&self) -> Value {
        serde_json::json!({
            "checksum/secret-cloud-controller-manager": self.cloud_controller_manager,
            "checksum/secret-cloud-controller-manager-server": self.cloud_controller_manager_server,
            "checksum/secret-cloudprovider": self.cloud_provider,
            "checksum/configmap-cloud-provider-config": self.cloud_provider_config,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerManagerValues {
    pub replicas: u32,
    pub project_id: String,
    pub cluster_id: String,
    pub partition_id: String,
    pub network_id: String,
    pub kubernetes_version: String,
    pub pod_network: String,
    pub pod_annotations: PodAnnotations,
    pub feature_gates: Option<BTreeMap<String, bool>>,
}

/// Authentication webhook and group rolebinding controller values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthnValues {
    pub tenant: String,
    pub cluster_name: String,
    pub oidc_issuer_url: String,
    pub oidc_issuer_client_id: String,
    pub debug: bool,
    pub provider_tenant: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountingValues {
    pub partition_id: String,
    pub tenant: String,
    pub project_name: String,
    pub project_id: String,
    pub cluster_name: String,
    pub cluster_id: String,
    pub sink_url: String,
    pub sink_hmac: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitWebhookValues {
    pub validate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthnWebhookConfigValues {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShootLimitWebhookValues {
    pub url: String,
    pub ca_bundle: String,
}

/// Output of one producer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueGroup {
    ControllerManager(ControllerManagerValues),
    Authn(AuthnValues),
    Accounting(AccountingValues),
    LimitWebhook(LimitWebhookValues),
    AuthnWebhookConfig(AuthnWebhookConfigValues),
    ShootLimitWebhook(ShootLimitWebhookValues),
}

impl ValueGroup {
    pub fn namespace(&self) -> ValueNamespace {
        match self {
            ValueGroup::ControllerManager(_) => ValueNamespace::ControllerManager,
            ValueGroup::Authn(_) => ValueNamespace::Authn,
            ValueGroup::Accounting(_) => ValueNamespace::Accounting,
            ValueGroup::LimitWebhook(_) => ValueNamespace::LimitWebhook,
            ValueGroup::AuthnWebhookConfig(_) => ValueNamespace::AuthnWebhookConfig,
            ValueGroup::ShootLimitWebhook(_) => ValueNamespace::ShootLimitWebhook,
        }
    }

    /// Flatten the group into keyed values
    pub fn entries(&self) -> Vec<(ValueKey, Value)> {
        match self {
            ValueGroup::ControllerManager(v) => {
                let mut entries = vec![
                    (ValueKey::Replicas, Value::from(v.replicas)),
                    (ValueKey::ProjectId, Value::from(v.project_id.clone())),
                    (ValueKey::ClusterId, Value::from(v.cluster_id.clone())),
                    (ValueKey::PartitionId, Value::from(v.partition_id.clone())),
                    (ValueKey::NetworkId, Value::from(v.network_id.clone())),
                    (ValueKey::KubernetesVersion, Value::from(v.kubernetes_version.clone())),
                    (ValueKey::PodNetwork, Value::from(v.pod_network.clone())),
                    (ValueKey::PodAnnotations, v.pod_annotations.to_value()),
                ];
                if let Some(gates) = &v.feature_gates {
                    let gates: Map<String, Value> = gates
                        .iter()
                        .map(|(gate, enabled)| (gate.clone(), Value::Bool(*enabled)))
                        .collect();
                    entries.push((ValueKey::FeatureGates, Value::Object(gates)));
                }
                entries
            }
            ValueGroup::Authn(v) => vec![
                (ValueKey::AuthnTenant, Value::from(v.tenant.clone())),
                (ValueKey::AuthnClusterName, Value::from(v.cluster_name.clone())),
                (ValueKey::AuthnOidcIssuerUrl, Value::from(v.oidc_issuer_url.clone())),
                (
                    ValueKey::AuthnOidcIssuerClientId,
                    Value::from(v.oidc_issuer_client_id.clone()),
                ),
                // the webhook chart reads this flag as a string
                (ValueKey::AuthnDebug, Value::from(v.debug.to_string())),
                (ValueKey::AuthnProviderTenant, Value::from(v.provider_tenant.clone())),
                (
                    ValueKey::GroupRolebindingClusterName,
                    Value::from(v.cluster_name.clone()),
                ),
            ],
            ValueGroup::Accounting(v) => vec![
                (ValueKey::AccountingPartitionId, Value::from(v.partition_id.clone())),
                (ValueKey::AccountingTenant, Value::from(v.tenant.clone())),
                (ValueKey::AccountingProjectName, Value::from(v.project_name.clone())),
                (ValueKey::AccountingProjectId, Value::from(v.project_id.clone())),
                (ValueKey::AccountingClusterName, Value::from(v.cluster_name.clone())),
                (ValueKey::AccountingClusterId, Value::from(v.cluster_id.clone())),
                (ValueKey::AccountingSinkUrl, Value::from(v.sink_url.clone())),
                (ValueKey::AccountingSinkHmac, Value::from(v.sink_hmac.clone())),
            ],
            ValueGroup::LimitWebhook(v) => {
                vec![(ValueKey::LimitWebhookValidate, Value::Bool(v.validate))]
            }
            ValueGroup::AuthnWebhookConfig(v) => {
                vec![(ValueKey::AuthnWebhookUrl, Value::from(v.url.clone()))]
            }
            ValueGroup::ShootLimitWebhook(v) => vec![
                (ValueKey::ShootLimitWebhookUrl, Value::from(v.url.clone())),
                (ValueKey::ShootLimitWebhookCaBundle, Value::from(v.ca_bundle.clone())),
            ],
        }
    }
}

/// Collects value groups, enforcing namespace disjointness
#[derive(Debug, Default)]
pub struct ValueAccumulator {
    namespaces: Vec<ValueNamespace>,
    values: BTreeMap<ValueKey, Value>,
}

impl ValueAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: ValueGroup) -> Result<(), ComposerError> {
        let namespace = group.namespace();
        if self.namespaces.contains(&namespace) {
            return Err(ComposerError::DuplicateNamespace(namespace));
        }

        let entries = group.entries();
        for (key, _) in &entries {
            if key.namespace() != namespace {
                return Err(ComposerError::ForeignKey {
                    namespace,
                    owner: key.namespace(),
                    key: key.as_str(),
                });
            }
            if self.values.contains_key(key) {
                return Err(ComposerError::KeyCollision { key: key.as_str() });
            }
        }

        self.namespaces.push(namespace);
        self.values.extend(entries);
        Ok(())
    }

    pub fn finish(self) -> ComposedValues {
        ComposedValues {
            values: self.values,
        }
    }
}

/// The flat configuration bag handed to the templating collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposedValues {
    values: BTreeMap<ValueKey, Value>,
}

impl ComposedValues {
    /// Compose a bag from a set of groups in the given order
    pub fn from_groups(
        groups: impl IntoIterator<Item = ValueGroup>,
    ) -> Result<Self, ComposerError> {
        let mut accumulator = ValueAccumulator::new();
        for group in groups {
            accumulator.insert(group)?;
        }
        Ok(accumulator.finish())
    }

    pub fn get(&self, key: ValueKey) -> Option<&Value> {
        self.values.get(&key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = ValueKey> + '_ {
        self.values.keys().copied()
    }

    /// Untyped map, keyed by the collaborator's key names
    pub fn to_map(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_str().to_string(), value.clone()))
            .collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }

    /// Canonical JSON encoding; identical inputs give identical bytes
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.to_map())
    }
}

impl Serialize for ComposedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}
