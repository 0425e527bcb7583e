// Copyright (c) 2025 - Cowboy AI, Inc.
//! Chart values for the control-plane charts
//!
//! [`ControlPlaneValuesProvider`] is the pipeline entry point for control
//! planes: decode, merge, connect to the inventory, compose.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::{
    AuthnWebhookConfigValues, ComposedValues, CompositionContext, Scaling, ShootLimitWebhookValues,
    ValueComposer, ValueGroup,
};
use crate::certificates::{
    droptailer_certificates, CertificateDescriptor, CertificateLifecycle, PkiIssuer,
    AUTHN_WEBHOOK, DATA_KEY_CA_CERTIFICATE, DROPTAILER_NAMESPACE, LIMIT_VALIDATING_WEBHOOK,
    LIMIT_VALIDATING_WEBHOOK_SERVER,
};
use crate::client::{read_inventory_credentials, SecretReader, WorkloadClusterApi};
use crate::cluster::{Cluster, ControlPlane};
use crate::config::ControllerConfig;
use crate::errors::ProviderResult;
use crate::inventory::InventoryConnector;
use crate::merge::merge_iam_config;
use crate::scheme::{
    cloud_profile_config_from_cluster, control_plane_config_from_control_plane,
    infrastructure_config_from_cluster, ConfigScheme,
};

/// Builds chart values for the control-plane charts of one cluster
pub struct ControlPlaneValuesProvider {
    scheme: Arc<ConfigScheme>,
    composer: ValueComposer,
    /// Secrets of the hosting cluster
    secrets: Arc<dyn SecretReader>,
    connector: Arc<dyn InventoryConnector>,
}

impl ControlPlaneValuesProvider {
    pub fn new(
        scheme: Arc<ConfigScheme>,
        config: &ControllerConfig,
        secrets: Arc<dyn SecretReader>,
        connector: Arc<dyn InventoryConnector>,
    ) -> Self {
        Self {
            scheme,
            composer: ValueComposer::standard(config.accounting.clone(), config.auth.clone()),
            secrets,
            connector,
        }
    }

    pub fn with_composer(mut self, composer: ValueComposer) -> Self {
        self.composer = composer;
        self
    }

    /// Values of the config chart, deployed before the control plane
    pub fn config_chart_values(&self, cluster: &Cluster) -> ProviderResult<ComposedValues> {
        let url = format!(
            "https://{}.{}.svc.cluster.local/authenticate",
            AUTHN_WEBHOOK, cluster.shoot.technical_id
        );
        Ok(ComposedValues::from_groups([ValueGroup::AuthnWebhookConfig(
            AuthnWebhookConfigValues { url },
        )])?)
    }

    /// Values of the control-plane chart
    pub async fn control_plane_chart_values(
        &self,
        control_plane: &ControlPlane,
        cluster: &Cluster,
        checksums: &BTreeMap<String, String>,
        scaling: Scaling,
    ) -> ProviderResult<ComposedValues> {
        let infrastructure = infrastructure_config_from_cluster(&self.scheme, cluster)?;
        let mut cp_config = control_plane_config_from_control_plane(&self.scheme, control_plane)?;
        let cloud_profile_config = cloud_profile_config_from_cluster(&self.scheme, cluster)?;

        let merged = merge_iam_config(
            cloud_profile_config
                .as_ref()
                .and_then(|c| c.iam_config.as_ref()),
            cp_config.iam_config.as_ref(),
        )?;
        cp_config.iam_config = Some(merged);

        let credentials =
            read_inventory_credentials(self.secrets.as_ref(), &control_plane.secret_ref).await?;
        let inventory = self.connector.connect(&credentials)?;

        let ctx = CompositionContext {
            cluster,
            infrastructure: &infrastructure,
            control_plane: &cp_config,
            checksums,
            scaling,
            inventory: inventory.as_ref(),
        };
        Ok(self.composer.compose(&ctx).await?)
    }

    /// Values of the chart applied inside the workload cluster.
    ///
    /// Also ensures the droptailer certificates in the workload cluster.
    pub async fn control_plane_shoot_chart_values(
        &self,
        cluster: &Cluster,
        shoot_api: &dyn WorkloadClusterApi,
        pki: &dyn PkiIssuer,
    ) -> ProviderResult<ComposedValues> {
        let namespace = &cluster.shoot.technical_id;
        let secret = self
            .secrets
            .get_secret(namespace, LIMIT_VALIDATING_WEBHOOK_SERVER)
            .await?;

        let ca: &[u8] = match secret.get(DATA_KEY_CA_CERTIFICATE) {
            Some(ca) => ca.as_slice(),
            None => {
                warn!(
                    "Secret {}/{} has no {}",
                    namespace, LIMIT_VALIDATING_WEBHOOK_SERVER, DATA_KEY_CA_CERTIFICATE
                );
                &[]
            }
        };

        let values = ComposedValues::from_groups([ValueGroup::ShootLimitWebhook(
            ShootLimitWebhookValues {
                url: format!(
                    "https://{}.{}.svc.cluster.local/validate",
                    LIMIT_VALIDATING_WEBHOOK, namespace
                ),
                ca_bundle: STANDARD.encode(ca),
            },
        )])?;

        self.ensure_droptailer_certificates(shoot_api, pki, &droptailer_certificates())
            .await?;

        Ok(values)
    }

    async fn ensure_droptailer_certificates(
        &self,
        shoot_api: &dyn WorkloadClusterApi,
        pki: &dyn PkiIssuer,
        descriptors: &[CertificateDescriptor],
    ) -> ProviderResult<()> {
        CertificateLifecycle::new(shoot_api, pki)
            .ensure(DROPTAILER_NAMESPACE, descriptors)
            .await?;
        info!("Droptailer certificates are in place");
        Ok(())
    }
}
