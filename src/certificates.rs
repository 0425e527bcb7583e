// Copyright (c) 2025 - Cowboy AI, Inc.
//! Certificate lifecycle
//!
//! Certificates are declared as [`CertificateDescriptor`]s. [`CertificateLifecycle`]
//! makes sure each one is backed by a secret in a target namespace of the
//! workload cluster. Issuance is delegated to a [`PkiIssuer`]; this module
//! only decides what must be issued and in which order.
//!
//! ```text
//! ensure(namespace, descriptors)
//!   ├─ get_namespace ── NotFound ──> create_namespace
//!   ├─ CA descriptors first
//!   └─ for each descriptor
//!        existing secret ──> reuse
//!        NotFound        ──> issue (signed by its CA) ──> create_secret
//! ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::client::{ClientError, SecretData, WorkloadClusterApi};

/// Name of the cluster CA secret
pub const CA_CLUSTER: &str = "ca";

/// Namespace of the droptailer in the workload cluster
pub const DROPTAILER_NAMESPACE: &str = "firewall";

pub const DROPTAILER_CLIENT: &str = "droptailer-client";
pub const DROPTAILER_SERVER: &str = "droptailer-server";

pub const CLOUD_CONTROLLER_MANAGER: &str = "cloud-controller-manager";
pub const CLOUD_CONTROLLER_MANAGER_SERVER: &str = "cloud-controller-manager-server";
pub const GROUP_ROLEBINDING_CONTROLLER: &str = "group-rolebinding-controller";
pub const AUTHN_WEBHOOK: &str = "kube-jwt-authn-webhook";
pub const AUTHN_WEBHOOK_SERVER: &str = "kube-jwt-authn-webhook-server";
pub const LIMIT_VALIDATING_WEBHOOK: &str = "limit-validating-webhook";
pub const LIMIT_VALIDATING_WEBHOOK_SERVER: &str = "limit-validating-webhook-server";
pub const ACCOUNTING_EXPORTER: &str = "accounting-exporter";

/// Secret data key of the CA certificate
pub const DATA_KEY_CA_CERTIFICATE: &str = "ca.crt";

const SYSTEM_PRIVILEGED_GROUP: &str = "system:masters";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertificateProvisioningError {
    #[error("could not look up namespace {namespace}: {source}")]
    NamespaceLookup {
        namespace: String,
        #[source]
        source: ClientError,
    },

    #[error("could not create namespace {namespace}: {source}")]
    NamespaceCreate {
        namespace: String,
        #[source]
        source: ClientError,
    },

    #[error("could not read secret {namespace}/{name}: {source}")]
    SecretLookup {
        namespace: String,
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("could not store secret {namespace}/{name}: {source}")]
    SecretStore {
        namespace: String,
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("certificate {name} is signed by unknown CA {ca}")]
    UnknownCa { name: String, ca: String },

    #[error("PKI could not issue certificate {name}: {reason}")]
    Issue { name: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertType {
    Ca,
    Client,
    Server,
}

/// Declarative description of one certificate secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateDescriptor {
    /// Secret name
    pub name: String,
    pub common_name: String,
    pub organization: Vec<String>,
    pub dns_names: Vec<String>,
    pub cert_type: CertType,
    /// Name of the CA descriptor that signs this certificate
    pub signing_ca: Option<String>,
}

impl CertificateDescriptor {
    pub fn ca(name: impl Into<String>, common_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            common_name: common_name.into(),
            organization: Vec::new(),
            dns_names: Vec::new(),
            cert_type: CertType::Ca,
            signing_ca: None,
        }
    }

    pub fn client(
        name: impl Into<String>,
        common_name: impl Into<String>,
        organization: &[&str],
        signing_ca: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            common_name: common_name.into(),
            organization: organization.iter().map(|o| o.to_string()).collect(),
            dns_names: Vec::new(),
            cert_type: CertType::Client,
            signing_ca: Some(signing_ca.into()),
        }
    }

    pub fn server(
        name: impl Into<String>,
        common_name: impl Into<String>,
        dns_names: Vec<String>,
        signing_ca: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            common_name: common_name.into(),
            organization: Vec::new(),
            dns_names,
            cert_type: CertType::Server,
            signing_ca: Some(signing_ca.into()),
        }
    }

    pub fn with_organization(mut self, organization: &[&str]) -> Self {
        self.organization = organization.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn is_ca(&self) -> bool {
        self.cert_type == CertType::Ca
    }
}

/// In-cluster DNS names of a service
pub fn dns_names_for_service(service: &str, namespace: &str) -> Vec<String> {
    vec![
        service.to_string(),
        format!("{}.{}", service, namespace),
        format!("{}.{}.svc", service, namespace),
        format!("{}.{}.svc.cluster.local", service, namespace),
    ]
}

/// Secrets of the control-plane components running in `namespace` of the
/// hosting cluster
pub fn control_plane_certificates(namespace: &str) -> Vec<CertificateDescriptor> {
    vec![
        CertificateDescriptor::ca(CA_CLUSTER, "kubernetes"),
        CertificateDescriptor::client(
            CLOUD_CONTROLLER_MANAGER,
            "system:cloud-controller-manager",
            &[SYSTEM_PRIVILEGED_GROUP],
            CA_CLUSTER,
        ),
        CertificateDescriptor::client(
            GROUP_ROLEBINDING_CONTROLLER,
            "system:group-rolebinding-controller",
            &[SYSTEM_PRIVILEGED_GROUP],
            CA_CLUSTER,
        ),
        CertificateDescriptor::server(
            AUTHN_WEBHOOK_SERVER,
            AUTHN_WEBHOOK,
            dns_names_for_service(AUTHN_WEBHOOK, namespace),
            CA_CLUSTER,
        ),
        CertificateDescriptor::server(
            LIMIT_VALIDATING_WEBHOOK_SERVER,
            LIMIT_VALIDATING_WEBHOOK,
            dns_names_for_service(LIMIT_VALIDATING_WEBHOOK, namespace),
            CA_CLUSTER,
        ),
        CertificateDescriptor::client(
            ACCOUNTING_EXPORTER,
            "system:accounting-exporter",
            &[ACCOUNTING_EXPORTER],
            CA_CLUSTER,
        ),
        CertificateDescriptor::server(
            CLOUD_CONTROLLER_MANAGER_SERVER,
            CLOUD_CONTROLLER_MANAGER,
            dns_names_for_service(CLOUD_CONTROLLER_MANAGER, namespace),
            CA_CLUSTER,
        ),
    ]
}

/// Client and server certificates of the firewall droptailer
pub fn droptailer_certificates() -> Vec<CertificateDescriptor> {
    vec![
        CertificateDescriptor::ca(CA_CLUSTER, "kubernetes"),
        CertificateDescriptor::client(
            DROPTAILER_CLIENT,
            "droptailer",
            &[DROPTAILER_CLIENT],
            CA_CLUSTER,
        ),
        CertificateDescriptor::server(DROPTAILER_SERVER, "droptailer", Vec::new(), CA_CLUSTER)
            .with_organization(&[DROPTAILER_SERVER]),
    ]
}

/// External certificate authority
#[async_trait]
pub trait PkiIssuer: Send + Sync {
    /// Issue key material for `descriptor`. `ca` is the signing CA's secret
    /// data, `None` for self-signed CAs.
    async fn issue(
        &self,
        descriptor: &CertificateDescriptor,
        ca: Option<&SecretData>,
    ) -> Result<SecretData, String>;
}

/// Ensures certificate secrets exist in the workload cluster
pub struct CertificateLifecycle<'a> {
    api: &'a dyn WorkloadClusterApi,
    pki: &'a dyn PkiIssuer,
}

impl<'a> CertificateLifecycle<'a> {
    pub fn new(api: &'a dyn WorkloadClusterApi, pki: &'a dyn PkiIssuer) -> Self {
        Self { api, pki }
    }

    /// Ensure every descriptor is backed by a secret in `namespace`.
    ///
    /// Existing secrets are returned untouched. Returns the secret data of
    /// every descriptor, keyed by name.
    pub async fn ensure(
        &self,
        namespace: &str,
        descriptors: &[CertificateDescriptor],
    ) -> Result<BTreeMap<String, SecretData>, CertificateProvisioningError> {
        self.ensure_namespace(namespace).await?;

        let (cas, leaves): (Vec<&CertificateDescriptor>, Vec<&CertificateDescriptor>) =
            descriptors.iter().partition(|d| d.is_ca());

        let mut ensured = BTreeMap::new();
        for descriptor in cas.into_iter().chain(leaves) {
            let data = self.ensure_secret(namespace, descriptor, &ensured).await?;
            ensured.insert(descriptor.name.clone(), data);
        }

        info!("Ensured {} certificate secrets in namespace {}", ensured.len(), namespace);
        Ok(ensured)
    }

    async fn ensure_namespace(&self, namespace: &str) -> Result<(), CertificateProvisioningError> {
        match self.api.get_namespace(namespace).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                info!("Creating namespace {}", namespace);
                self.api.create_namespace(namespace).await.map_err(|source| {
                    CertificateProvisioningError::NamespaceCreate {
                        namespace: namespace.to_string(),
                        source,
                    }
                })
            }
            Err(source) => Err(CertificateProvisioningError::NamespaceLookup {
                namespace: namespace.to_string(),
                source,
            }),
        }
    }

    async fn ensure_secret(
        &self,
        namespace: &str,
        descriptor: &CertificateDescriptor,
        ensured: &BTreeMap<String, SecretData>,
    ) -> Result<SecretData, CertificateProvisioningError> {
        match self.api.get_secret(namespace, &descriptor.name).await {
            Ok(existing) => {
                debug!("Reusing secret {}/{}", namespace, descriptor.name);
                return Ok(existing);
            }
            Err(e) if e.is_not_found() => {}
            Err(source) => {
                return Err(CertificateProvisioningError::SecretLookup {
                    namespace: namespace.to_string(),
                    name: descriptor.name.clone(),
                    source,
                })
            }
        }

        let ca = match &descriptor.signing_ca {
            Some(ca) => Some(ensured.get(ca).ok_or_else(|| {
                CertificateProvisioningError::UnknownCa {
                    name: descriptor.name.clone(),
                    ca: ca.clone(),
                }
            })?),
            None => None,
        };

        debug!("Issuing certificate {} in {}", descriptor.name, namespace);
        let data = self.pki.issue(descriptor, ca).await.map_err(|reason| {
            CertificateProvisioningError::Issue {
                name: descriptor.name.clone(),
                reason,
            }
        })?;

        self.api
            .create_secret(namespace, &descriptor.name, data.clone())
            .await
            .map_err(|source| CertificateProvisioningError::SecretStore {
                namespace: namespace.to_string(),
                name: descriptor.name.clone(),
                source,
            })?;

        Ok(data)
    }
}
