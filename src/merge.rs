// Copyright (c) 2025 - Cowboy AI, Inc.
//! Scoped configuration precedence
//!
//! Cloud-profile settings are defaults; control-plane settings override them
//! field by field. Each field is resolved on its own through [`Precedence`],
//! so a partial override at any depth never replaces a whole section.

use thiserror::Error;

use crate::apis::{ConnectorConfig, IamConfig, IdmConfig, IssuerConfig, NamespaceGroupConfig};

/// Merge failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("IAM field {field} is set neither in the cloud profile nor in the control plane")]
    MissingField { field: &'static str },
}

/// Outcome of resolving one field across the two scopes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precedence<T> {
    /// The control plane set the field
    Override(T),
    /// Only the cloud profile set the field
    Base(T),
    Unset,
}

impl<T> Precedence<T> {
    pub fn resolve(base: Option<T>, over: Option<T>) -> Self {
        match (base, over) {
            (_, Some(value)) => Precedence::Override(value),
            (Some(value), None) => Precedence::Base(value),
            (None, None) => Precedence::Unset,
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Precedence::Unset)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Precedence::Override(value) | Precedence::Base(value) => Some(value),
            Precedence::Unset => None,
        }
    }
}

/// Resolve one field reached through `get` on either side
pub fn resolve_field<S, T, F>(base: Option<&S>, over: Option<&S>, get: F) -> Precedence<T>
where
    T: Clone,
    F: Fn(&S) -> Option<&T>,
{
    Precedence::resolve(
        base.and_then(&get).cloned(),
        over.and_then(&get).cloned(),
    )
}

/// Merge the IAM sections of the cloud profile (`base`) and control plane (`over`).
///
/// The issuer URL and client ID are required downstream by the authentication
/// webhook and must be set on at least one side.
pub fn merge_iam_config(
    base: Option<&IamConfig>,
    over: Option<&IamConfig>,
) -> Result<IamConfig, MergeError> {
    let merged = IamConfig {
        issuer_config: merge_issuer(
            base.and_then(|c| c.issuer_config.as_ref()),
            over.and_then(|c| c.issuer_config.as_ref()),
        ),
        idm_config: merge_idm(
            base.and_then(|c| c.idm_config.as_ref()),
            over.and_then(|c| c.idm_config.as_ref()),
        ),
        group_config: merge_group(
            base.and_then(|c| c.group_config.as_ref()),
            over.and_then(|c| c.group_config.as_ref()),
        ),
    };

    let issuer = merged.issuer_config.as_ref();
    if issuer.and_then(|i| i.url.as_ref()).is_none() {
        return Err(MergeError::MissingField {
            field: "iamconfig.issuerConfig.url",
        });
    }
    if issuer.and_then(|i| i.client_id.as_ref()).is_none() {
        return Err(MergeError::MissingField {
            field: "iamconfig.issuerConfig.clientId",
        });
    }

    Ok(merged)
}

fn present<S>(base: Option<&S>, over: Option<&S>) -> bool {
    base.is_some() || over.is_some()
}

fn merge_issuer(base: Option<&IssuerConfig>, over: Option<&IssuerConfig>) -> Option<IssuerConfig> {
    if !present(base, over) {
        return None;
    }
    Some(IssuerConfig {
        url: resolve_field(base, over, |c| c.url.as_ref()).into_option(),
        client_id: resolve_field(base, over, |c| c.client_id.as_ref()).into_option(),
    })
}

fn merge_idm(base: Option<&IdmConfig>, over: Option<&IdmConfig>) -> Option<IdmConfig> {
    if !present(base, over) {
        return None;
    }
    Some(IdmConfig {
        idm_type: resolve_field(base, over, |c| c.idm_type.as_ref()).into_option(),
        connector_config: merge_connector(
            base.and_then(|c| c.connector_config.as_ref()),
            over.and_then(|c| c.connector_config.as_ref()),
        ),
    })
}

fn merge_connector(
    base: Option<&ConnectorConfig>,
    over: Option<&ConnectorConfig>,
) -> Option<ConnectorConfig> {
    if !present(base, over) {
        return None;
    }
    Some(ConnectorConfig {
        idm_api_url: resolve_field(base, over, |c| c.idm_api_url.as_ref()).into_option(),
        idm_api_user: resolve_field(base, over, |c| c.idm_api_user.as_ref()).into_option(),
        idm_api_password: resolve_field(base, over, |c| c.idm_api_password.as_ref())
            .into_option(),
        idm_system_id: resolve_field(base, over, |c| c.idm_system_id.as_ref()).into_option(),
        idm_system_type: resolve_field(base, over, |c| c.idm_system_type.as_ref())
            .into_option(),
        idm_access_code: resolve_field(base, over, |c| c.idm_access_code.as_ref())
            .into_option(),
        idm_customer_id: resolve_field(base, over, |c| c.idm_customer_id.as_ref())
            .into_option(),
    })
}

fn merge_group(
    base: Option<&NamespaceGroupConfig>,
    over: Option<&NamespaceGroupConfig>,
) -> Option<NamespaceGroupConfig> {
    if !present(base, over) {
        return None;
    }
    Some(NamespaceGroupConfig {
        excluded_namespaces: resolve_field(base, over, |c| c.excluded_namespaces.as_ref())
            .into_option(),
        expected_groups_list: resolve_field(base, over, |c| c.expected_groups_list.as_ref())
            .into_option(),
        namespace_max_length: resolve_field(base, over, |c| c.namespace_max_length.as_ref())
            .into_option(),
    })
}
