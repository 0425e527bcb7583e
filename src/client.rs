// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cluster API collaborators
//!
//! Secrets, namespaces and chart application live in Kubernetes API servers
//! that this crate never talks to directly. The reconciler supplies
//! implementations of these traits: one for the hosting cluster and one for
//! the workload cluster.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::cluster::SecretReference;
use crate::config::InventoryCredentials;
use crate::errors::ProviderResult;

/// Secret payload: key → bytes
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Errors reported by a cluster API
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("cluster API error: {0}")]
    Api(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }
}

#[async_trait]
pub trait SecretReader: Send + Sync {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, ClientError>;
}

/// Write access to namespaces and secrets of the workload cluster
#[async_trait]
pub trait WorkloadClusterApi: SecretReader {
    async fn get_namespace(&self, name: &str) -> Result<(), ClientError>;

    async fn create_namespace(&self, name: &str) -> Result<(), ClientError>;

    async fn create_secret(
        &self,
        namespace: &str,
        name: &str,
        data: SecretData,
    ) -> Result<(), ClientError>;
}

/// The templating/deployment collaborator
#[async_trait]
pub trait ChartApplier: Send + Sync {
    async fn apply_chart(
        &self,
        chart: &str,
        namespace: &str,
        release: &str,
        values: Value,
    ) -> Result<(), ClientError>;
}

/// Read the inventory credentials a resource's secret reference points at
pub async fn read_inventory_credentials(
    secrets: &dyn SecretReader,
    secret_ref: &SecretReference,
) -> ProviderResult<InventoryCredentials> {
    debug!("Reading inventory credentials from secret {}", secret_ref);
    let data = secrets
        .get_secret(&secret_ref.namespace, &secret_ref.name)
        .await?;
    Ok(InventoryCredentials::from_secret_data(
        &secret_ref.to_string(),
        &data,
    )?)
}
