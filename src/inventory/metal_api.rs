// Copyright (c) 2025 - Cowboy AI, Inc.

//! Inventory client for the metal API
//!
//! Speaks the read-only endpoints the resolver needs:
//!
//! ```text
//! find_networks(query) = POST /v1/network/find {projectid}
//!                      + POST /v1/network/find {privatesuper: true}
//!                      + GET  /v1/network/{parent} for ancestors still missing
//! get_project(id)      = GET  /v1/project/{id}
//! ```
//!
//! A 404 on a project is `ProjectNotFound`. Any other failed request is
//! `Unavailable`.
//!
//! # Example
//!
//! ```rust,no_run
//! use metal_provider_core::config::{InventoryConfig, InventoryCredentials};
//! use metal_provider_core::inventory::{InventoryResolver, MetalApiClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = InventoryCredentials {
//!         api_url: "http://metal-api:8080".to_string(),
//!         api_key: "token".to_string(),
//!         api_hmac: String::new(),
//!     };
//!     let client = MetalApiClient::new(&InventoryConfig::default(), &credentials)?;
//!
//!     let network = InventoryResolver::new(&client)
//!         .resolve_private_network("project1", "10.250.0.0/19")
//!         .await?;
//!     println!("private network: {}", network.id);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    InventoryClient, InventoryConnector, InventoryError, InventoryNetwork, InventoryProject,
    NetworkQuery,
};
use crate::config::{ConfigError, InventoryConfig, InventoryCredentials, API_KEY_KEY};

/// Network find request body
#[derive(Debug, Clone, Default, Serialize)]
struct NetworkFindRequest {
    #[serde(rename = "projectid", skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(rename = "partitionid", skip_serializing_if = "Option::is_none")]
    partition_id: Option<String>,
    #[serde(rename = "destinationprefixes", skip_serializing_if = "Vec::is_empty")]
    destination_prefixes: Vec<String>,
    #[serde(rename = "privatesuper", skip_serializing_if = "Option::is_none")]
    private_super: Option<bool>,
}

impl From<&NetworkQuery> for NetworkFindRequest {
    fn from(query: &NetworkQuery) -> Self {
        Self {
            project_id: query.project_id.clone(),
            partition_id: query.partition_id.clone(),
            destination_prefixes: query.destination_prefix.iter().cloned().collect(),
            private_super: None,
        }
    }
}

/// Network as returned by the metal API
#[derive(Debug, Clone, Deserialize)]
struct NetworkResponse {
    id: String,
    #[serde(default, rename = "projectid")]
    project_id: Option<String>,
    #[serde(default, rename = "partitionid")]
    partition_id: Option<String>,
    #[serde(default, rename = "destinationprefixes")]
    destination_prefixes: Vec<String>,
    #[serde(default, rename = "privatesuper")]
    private_super: Option<bool>,
    #[serde(default)]
    underlay: Option<bool>,
    #[serde(default, rename = "parentnetworkid")]
    parent_network_id: Option<String>,
}

impl From<NetworkResponse> for InventoryNetwork {
    fn from(response: NetworkResponse) -> Self {
        Self {
            id: response.id,
            project_id: response.project_id.filter(|p| !p.is_empty()),
            partition_id: response.partition_id.filter(|p| !p.is_empty()),
            destination_prefixes: response.destination_prefixes,
            private_super: response.private_super.unwrap_or(false),
            underlay: response.underlay.unwrap_or(false),
            parent_network_id: response.parent_network_id.filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectResponse {
    project: ProjectBody,
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectBody {
    #[serde(default)]
    meta: Option<ProjectMeta>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    tenant_id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectMeta {
    #[serde(default)]
    id: String,
}

/// HTTP client against one metal API endpoint
pub struct MetalApiClient {
    base_url: String,
    client: Client,
}

impl MetalApiClient {
    pub fn new(
        config: &InventoryConfig,
        credentials: &InventoryCredentials,
    ) -> Result<Self, InventoryError> {
        info!("Creating inventory client for {}", credentials.api_url);

        let mut headers = reqwest::header::HeaderMap::new();
        if !credentials.api_key.is_empty() {
            let value = format!("Bearer {}", credentials.api_key)
                .parse()
                .map_err(|_| {
                    ConfigError::Invalid(format!(
                        "{} is not a valid authorization header value",
                        API_KEY_KEY
                    ))
                })?;
            headers.insert("Authorization", value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                InventoryError::Unavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url: credentials.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn find(
        &self,
        body: &NetworkFindRequest,
    ) -> Result<Vec<InventoryNetwork>, InventoryError> {
        let url = self.url("/v1/network/find");
        debug!("POST {} {:?}", url, body);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| InventoryError::Unavailable(format!("metal API error: {}", e)))?;

        if !response.status().is_success() {
            return Err(unexpected_status(response, "network find").await);
        }

        let networks: Vec<NetworkResponse> = response.json().await.map_err(|e| {
            InventoryError::Unavailable(format!("invalid network find response: {}", e))
        })?;

        Ok(networks.into_iter().map(InventoryNetwork::from).collect())
    }

    /// `None` when the inventory no longer knows the network
    async fn get_network(&self, id: &str) -> Result<Option<InventoryNetwork>, InventoryError> {
        let url = self.url(&format!("/v1/network/{}", id));
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| InventoryError::Unavailable(format!("metal API error: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let network: NetworkResponse = response.json().await.map_err(|e| {
                    InventoryError::Unavailable(format!("invalid network response: {}", e))
                })?;
                Ok(Some(network.into()))
            }
            _ => Err(unexpected_status(response, &format!("network {}", id)).await),
        }
    }

    /// Add the private super networks of the partition and every ancestor
    /// still missing from `networks`
    async fn with_ancestors(
        &self,
        mut networks: Vec<InventoryNetwork>,
        partition_id: Option<String>,
    ) -> Result<Vec<InventoryNetwork>, InventoryError> {
        let supers = self
            .find(&NetworkFindRequest {
                partition_id,
                private_super: Some(true),
                ..Default::default()
            })
            .await?;

        let mut known: BTreeSet<String> = networks.iter().map(|n| n.id.clone()).collect();
        for network in supers {
            if known.insert(network.id.clone()) {
                networks.push(network);
            }
        }

        let mut next = 0;
        while next < networks.len() {
            let parent = networks[next].parent_network_id.clone();
            next += 1;
            let Some(parent) = parent else { continue };
            if !known.insert(parent.clone()) {
                continue;
            }
            match self.get_network(&parent).await? {
                Some(network) => networks.push(network),
                None => warn!("Parent network {} is not known to the inventory", parent),
            }
        }

        Ok(networks)
    }
}

async fn unexpected_status(response: Response, what: &str) -> InventoryError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    InventoryError::Unavailable(format!("metal API returned {} for {}: {}", status, what, body))
}

#[async_trait]
impl InventoryClient for MetalApiClient {
    async fn find_networks(
        &self,
        query: &NetworkQuery,
    ) -> Result<Vec<InventoryNetwork>, InventoryError> {
        let networks = self.find(&NetworkFindRequest::from(query)).await?;
        if query.project_id.is_none() {
            return Ok(networks);
        }
        // super networks carry no project, the project query never returns them
        self.with_ancestors(networks, query.partition_id.clone()).await
    }

    async fn get_project(&self, project_id: &str) -> Result<InventoryProject, InventoryError> {
        let url = self.url(&format!("/v1/project/{}", project_id));
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| InventoryError::Unavailable(format!("metal API error: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(InventoryError::ProjectNotFound {
                project_id: project_id.to_string(),
            }),
            status if status.is_success() => {
                let body: ProjectResponse = response.json().await.map_err(|e| {
                    InventoryError::Unavailable(format!("invalid project response: {}", e))
                })?;
                let id = body
                    .project
                    .meta
                    .map(|meta| meta.id)
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| project_id.to_string());
                Ok(InventoryProject {
                    id,
                    name: body.project.name,
                    tenant_id: body.project.tenant_id,
                })
            }
            _ => Err(unexpected_status(response, &format!("project {}", project_id)).await),
        }
    }
}

/// Connects to the metal API named by each cluster's credentials
#[derive(Debug, Clone, Default)]
pub struct MetalApiConnector {
    config: InventoryConfig,
}

impl MetalApiConnector {
    pub fn new(config: InventoryConfig) -> Self {
        Self { config }
    }
}

impl InventoryConnector for MetalApiConnector {
    fn connect(
        &self,
        credentials: &InventoryCredentials,
    ) -> Result<Arc<dyn InventoryClient>, InventoryError> {
        Ok(Arc::new(MetalApiClient::new(&self.config, credentials)?))
    }
}
