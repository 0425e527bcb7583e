// Copyright (c) 2025 - Cowboy AI, Inc.
//! Controller configuration
//!
//! Settings owned by the controller process rather than by any cluster:
//! the accounting sink, the authentication provider tenant, the machine image
//! mapping and the inventory endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::apis::MachineImages;

/// Secret data key of the inventory API URL
pub const API_URL_KEY: &str = "metalAPIURL";

/// Secret data key of the inventory API key
pub const API_KEY_KEY: &str = "metalAPIKey";

/// Secret data key of the inventory API HMAC
pub const API_HMAC_KEY: &str = "metalAPIHMac";

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("secret {secret} is missing key {key}")]
    MissingSecretKey { secret: String, key: &'static str },

    #[error("secret {secret} key {key} is not valid UTF-8")]
    InvalidSecretValue { secret: String, key: &'static str },

    #[error("invalid controller configuration: {0}")]
    Invalid(String),
}

/// Where usage records of the cluster are shipped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingConfig {
    #[serde(default)]
    pub accounting_sink_url: String,
    #[serde(default)]
    pub accounting_sink_hmac: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(default)]
    pub provider_tenant: String,
}

/// Connection settings for the inventory service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

/// Inventory credentials read from a cluster's cloud-provider secret
#[derive(Clone, PartialEq, Eq)]
pub struct InventoryCredentials {
    pub api_url: String,
    pub api_key: String,
    pub api_hmac: String,
}

impl std::fmt::Debug for InventoryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryCredentials")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("api_hmac", &"<redacted>")
            .finish()
    }
}

impl InventoryCredentials {
    /// Read the three credential keys from secret data.
    ///
    /// `secret` only names the source in error messages.
    pub fn from_secret_data(
        secret: &str,
        data: &BTreeMap<String, Vec<u8>>,
    ) -> Result<Self, ConfigError> {
        let read = |key: &'static str| -> Result<String, ConfigError> {
            let bytes = data.get(key).ok_or_else(|| ConfigError::MissingSecretKey {
                secret: secret.to_string(),
                key,
            })?;
            String::from_utf8(bytes.clone()).map_err(|_| ConfigError::InvalidSecretValue {
                secret: secret.to_string(),
                key,
            })
        };

        Ok(Self {
            api_url: read(API_URL_KEY)?,
            api_key: read(API_KEY_KEY)?,
            api_hmac: read(API_HMAC_KEY)?,
        })
    }
}

/// Everything the controller is started with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfig {
    #[serde(default)]
    pub accounting: AccountingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub machine_images: MachineImages,
    #[serde(default)]
    pub inventory: InventoryConfig,
}

impl ControllerConfig {
    /// Load accounting and auth settings from environment variables
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();

        Self {
            accounting: AccountingConfig {
                accounting_sink_url: var("ACCOUNTING_SINK_URL"),
                accounting_sink_hmac: var("ACCOUNTING_SINK_HMAC"),
            },
            auth: AuthConfig {
                provider_tenant: var("AUTH_PROVIDER_TENANT"),
            },
            machine_images: MachineImages::default(),
            inventory: InventoryConfig {
                timeout_secs: std::env::var("INVENTORY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_timeout),
            },
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(bytes).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
