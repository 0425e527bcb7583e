// Copyright (c) 2025 - Cowboy AI, Inc.
//! IAM configuration sections
//!
//! Every field is optional: cloud profiles carry defaults, control planes
//! carry overrides, and [`crate::merge::merge_iam_config`] resolves them.

use serde::{Deserialize, Serialize};

/// Identity and access configuration of a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_config: Option<IssuerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idm_config: Option<IdmConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_config: Option<NamespaceGroupConfig>,
}

/// OIDC token issuer used by the authentication webhook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Identity management backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdmConfig {
    #[serde(default, rename = "idmtype", skip_serializing_if = "Option::is_none")]
    pub idm_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_config: Option<ConnectorConfig>,
}

/// Connection parameters of the user directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idm_api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idm_api_user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idm_api_password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idm_system_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idm_system_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idm_access_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idm_customer_id: Option<String>,
}

/// Namespace to group mapping rules of the group rolebinding controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceGroupConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_namespaces: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_groups_list: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_max_length: Option<i32>,
}
