// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for provider operations

use thiserror::Error;

use crate::certificates::CertificateProvisioningError;
use crate::client::ClientError;
use crate::config::ConfigError;
use crate::inventory::InventoryError;
use crate::merge::MergeError;
use crate::scheme::DecodeError;
use crate::values::ComposerError;
use crate::worker::PlanError;

/// Errors that can surface to the calling reconciler
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider-config payload could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Cloud-profile and control-plane settings could not be merged
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// Inventory lookup failed
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// A value producer failed or two producers wrote the same key
    #[error(transparent)]
    Composer(#[from] ComposerError),

    /// Machine classes or deployments could not be planned
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Certificate secrets could not be ensured
    #[error(transparent)]
    CertificateProvisioning(#[from] CertificateProvisioningError),

    /// Controller configuration or credentials are invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A cluster API call failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Chart values could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Serialization(err.to_string())
    }
}
