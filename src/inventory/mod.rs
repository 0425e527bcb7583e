// Copyright (c) 2025 - Cowboy AI, Inc.
//! Inventory lookups
//!
//! The inventory service is the system of record for networks and projects.
//! This module defines the read-only client seam ([`InventoryClient`]), the
//! entities it returns, and [`InventoryResolver`], which turns a project and a
//! node CIDR into the cluster's private network.
//!
//! # Private network selection
//!
//! ```text
//! find_networks(project) ──> candidates
//!        │ drop underlay and public networks
//!        │ keep networks with a destination prefix ⊋ node CIDR
//!        ▼
//! sort by (longest matching prefix desc, id asc) ──> first
//! ```

#[cfg(feature = "metal-api")]
pub mod metal_api;

#[cfg(feature = "metal-api")]
pub use metal_api::{MetalApiClient, MetalApiConnector};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, InventoryCredentials};
use crate::network::CidrPrefix;

/// Inventory failures.
///
/// The resolver cannot tell transient from permanent failures; callers own
/// retry policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("no private network of project {project_id} covers node network {node_cidr}")]
    NetworkNotFound {
        project_id: String,
        node_cidr: String,
    },

    #[error("project {project_id} not found in inventory")]
    ProjectNotFound { project_id: String },

    #[error("networks {candidates:?} of project {project_id} all cover node network {node_cidr}")]
    Ambiguous {
        project_id: String,
        node_cidr: String,
        candidates: Vec<String>,
    },

    #[error("inventory unavailable: {0}")]
    Unavailable(String),

    #[error("invalid inventory query: {0}")]
    InvalidQuery(String),

    #[error("invalid inventory credentials: {0}")]
    Credentials(#[from] ConfigError),
}

impl InventoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            InventoryError::NetworkNotFound { .. } | InventoryError::ProjectNotFound { .. }
        )
    }
}

/// A network as reported by the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryNetwork {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub partition_id: Option<String>,
    #[serde(default)]
    pub destination_prefixes: Vec<String>,
    #[serde(default)]
    pub private_super: bool,
    #[serde(default)]
    pub underlay: bool,
    #[serde(default)]
    pub parent_network_id: Option<String>,
}

impl InventoryNetwork {
    /// Networks owned by no project that are not a private super network are
    /// shared public networks.
    pub fn is_public(&self) -> bool {
        self.project_id.is_none() && !self.private_super
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryProject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tenant_id: String,
}

/// Network search parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_prefix: Option<String>,
}

impl NetworkQuery {
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            ..Default::default()
        }
    }
}

/// Read-only access to the inventory service.
///
/// `find_networks` returns the networks of the queried project together with
/// the private super networks they descend from.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    async fn find_networks(
        &self,
        query: &NetworkQuery,
    ) -> Result<Vec<InventoryNetwork>, InventoryError>;

    async fn get_project(&self, project_id: &str) -> Result<InventoryProject, InventoryError>;
}

/// Builds an inventory client from the credentials of a cluster
pub trait InventoryConnector: Send + Sync {
    fn connect(
        &self,
        credentials: &InventoryCredentials,
    ) -> Result<Arc<dyn InventoryClient>, InventoryError>;
}

/// How several matching networks are narrowed to one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// Longest matching prefix wins, then the lowest network ID
    #[default]
    MostSpecific,
    /// More than one match is an [`InventoryError::Ambiguous`]
    Strict,
}

/// Resolves inventory entities for one reconciliation
pub struct InventoryResolver<'a> {
    client: &'a dyn InventoryClient,
    tie_break: TieBreak,
}

impl<'a> InventoryResolver<'a> {
    pub fn new(client: &'a dyn InventoryClient) -> Self {
        Self {
            client,
            tie_break: TieBreak::default(),
        }
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Find the private network of `project_id` whose destination prefixes
    /// strictly contain `node_cidr`.
    pub async fn resolve_private_network(
        &self,
        project_id: &str,
        node_cidr: &str,
    ) -> Result<InventoryNetwork, InventoryError> {
        let node = CidrPrefix::new(node_cidr).map_err(|e| {
            InventoryError::InvalidQuery(format!("node network {:?}: {}", node_cidr, e))
        })?;

        debug!(
            "Looking up private network for project {} and node network {}",
            project_id, node
        );

        let networks = self
            .client
            .find_networks(&NetworkQuery::for_project(project_id))
            .await?;

        let mut candidates: Vec<(u8, InventoryNetwork)> = networks
            .into_iter()
            .filter(|network| !network.underlay && !network.is_public())
            .filter(|network| {
                network.private_super || network.project_id.as_deref() == Some(project_id)
            })
            .filter_map(|network| {
                covering_prefix_length(&network, &node).map(|length| (length, network))
            })
            .collect();

        candidates.sort_by(|(len_a, a), (len_b, b)| {
            (Reverse(*len_a), &a.id).cmp(&(Reverse(*len_b), &b.id))
        });

        if candidates.len() > 1 && self.tie_break == TieBreak::Strict {
            return Err(InventoryError::Ambiguous {
                project_id: project_id.to_string(),
                node_cidr: node_cidr.to_string(),
                candidates: candidates.into_iter().map(|(_, n)| n.id).collect(),
            });
        }

        match candidates.into_iter().next() {
            Some((_, network)) => {
                info!(
                    "Resolved private network {} for project {} ({})",
                    network.id, project_id, node
                );
                Ok(network)
            }
            None => Err(InventoryError::NetworkNotFound {
                project_id: project_id.to_string(),
                node_cidr: node_cidr.to_string(),
            }),
        }
    }

    pub async fn resolve_project(
        &self,
        project_id: &str,
    ) -> Result<InventoryProject, InventoryError> {
        debug!("Looking up project {}", project_id);
        self.client.get_project(project_id).await
    }
}

/// Length of the most specific destination prefix of `network` that strictly
/// contains `node`
fn covering_prefix_length(network: &InventoryNetwork, node: &CidrPrefix) -> Option<u8> {
    network
        .destination_prefixes
        .iter()
        .filter_map(|prefix| match CidrPrefix::new(prefix) {
            Ok(prefix) => Some(prefix),
            Err(e) => {
                warn!(
                    "Ignoring invalid destination prefix {:?} of network {}: {}",
                    prefix, network.id, e
                );
                None
            }
        })
        .filter(|prefix| prefix.is_strict_superset_of(node))
        .map(|prefix| prefix.prefix_length())
        .max()
}
