// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provider configuration types
//!
//! Typed forms of the opaque provider-config payloads embedded in cloud
//! profiles, infrastructures and control planes, plus the controller's machine
//! image mapping. All of them are produced by [`crate::scheme::ConfigScheme`]
//! and are immutable once decoded.
//!
//! # Kinds
//!
//! | kind | carried by |
//! |---|---|
//! | [`CloudProfileConfig`] | cloud profile |
//! | [`InfrastructureConfig`] | shoot / infrastructure |
//! | [`ControlPlaneConfig`] | control plane |
//! | [`MachineImages`] | controller configuration |

pub mod iam;
pub mod provider;

pub use iam::{ConnectorConfig, IamConfig, IdmConfig, IssuerConfig, NamespaceGroupConfig};
pub use provider::{
    CloudControllerManagerConfig, CloudProfileConfig, ControlPlaneConfig, Firewall,
    InfrastructureConfig, MachineImage, MachineImages,
};

/// API group of every provider-config kind
pub const GROUP_NAME: &str = "metal.provider.extensions.gardener.cloud";

/// Version served by this crate
pub const SERVED_VERSION: &str = "v1alpha1";

/// `apiVersion` value stamped on encoded payloads
pub fn served_api_version() -> String {
    format!("{}/{}", GROUP_NAME, SERVED_VERSION)
}
