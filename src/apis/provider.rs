// Copyright (c) 2025 - Cowboy AI, Inc.
//! Scope-level provider configuration kinds

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::iam::IamConfig;

/// Cloud-profile scoped defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudProfileConfig {
    #[serde(default, rename = "iamconfig", skip_serializing_if = "Option::is_none")]
    pub iam_config: Option<IamConfig>,
}

/// Infrastructure placement of a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureConfig {
    #[serde(default)]
    pub firewall: Firewall,

    #[serde(rename = "partitionID")]
    pub partition_id: String,

    #[serde(rename = "projectID")]
    pub project_id: String,
}

/// Firewall in front of the cluster's private network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firewall {
    #[serde(default)]
    pub size: String,

    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub networks: Vec<String>,
}

/// Control-plane scoped settings; its IAM section overrides the cloud profile's
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_controller_manager: Option<CloudControllerManagerConfig>,

    #[serde(default, rename = "iamconfig", skip_serializing_if = "Option::is_none")]
    pub iam_config: Option<IamConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudControllerManagerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_gates: Option<BTreeMap<String, bool>>,
}

/// One entry of the image mapping: logical name/version to inventory image ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineImage {
    pub name: String,
    pub version: String,
    pub image: String,
}

/// Pool image mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineImages {
    #[serde(default)]
    pub machine_images: Vec<MachineImage>,
}

impl MachineImages {
    /// Look up the inventory image for a pool's image reference
    pub fn find(&self, name: &str, version: &str) -> Option<&MachineImage> {
        self.machine_images
            .iter()
            .find(|image| image.name == name && image.version == version)
    }
}
