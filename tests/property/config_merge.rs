// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for IAM config precedence

use metal_provider_core::apis::{
    ConnectorConfig, IamConfig, IdmConfig, IssuerConfig, NamespaceGroupConfig,
};
use metal_provider_core::merge::{merge_iam_config, MergeError};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn field() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z]{1,8}")
}

fn issuer() -> impl Strategy<Value = Option<IssuerConfig>> {
    proptest::option::of(
        (field(), field()).prop_map(|(url, client_id)| IssuerConfig { url, client_id }),
    )
}

fn connector() -> impl Strategy<Value = Option<ConnectorConfig>> {
    proptest::option::of((field(), field(), field()).prop_map(|(url, user, system)| {
        ConnectorConfig {
            idm_api_url: url,
            idm_api_user: user,
            idm_system_id: system,
            ..Default::default()
        }
    }))
}

fn idm() -> impl Strategy<Value = Option<IdmConfig>> {
    proptest::option::of((field(), connector()).prop_map(|(idm_type, connector_config)| IdmConfig {
        idm_type,
        connector_config,
    }))
}

fn group() -> impl Strategy<Value = Option<NamespaceGroupConfig>> {
    proptest::option::of(
        (field(), proptest::option::of(1i32..64)).prop_map(|(excluded, max)| NamespaceGroupConfig {
            excluded_namespaces: excluded,
            expected_groups_list: None,
            namespace_max_length: max,
        }),
    )
}

fn iam() -> impl Strategy<Value = IamConfig> {
    (issuer(), idm(), group()).prop_map(|(issuer_config, idm_config, group_config)| IamConfig {
        issuer_config,
        idm_config,
        group_config,
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: merging the override a second time changes nothing
    #[test]
    fn prop_merge_is_idempotent(base in iam(), over in iam()) {
        if let Ok(once) = merge_iam_config(Some(&base), Some(&over)) {
            let twice = merge_iam_config(Some(&once), Some(&over));
            prop_assert_eq!(twice, Ok(once));
        }
    }

    /// Property: a field set in the override always wins
    #[test]
    fn prop_override_wins(base in iam(), over in iam()) {
        if let Ok(merged) = merge_iam_config(Some(&base), Some(&over)) {
            let over_url = over.issuer_config.as_ref().and_then(|i| i.url.clone());
            if over_url.is_some() {
                prop_assert_eq!(merged.issuer_config.and_then(|i| i.url), over_url);
            }
        }
    }

    /// Property: a field unset in the override falls back to the base
    #[test]
    fn prop_unset_falls_back(base in iam(), over in iam()) {
        if let Ok(merged) = merge_iam_config(Some(&base), Some(&over)) {
            let over_type = over.idm_config.as_ref().and_then(|i| i.idm_type.clone());
            let base_type = base.idm_config.as_ref().and_then(|i| i.idm_type.clone());
            let merged_type = merged.idm_config.and_then(|i| i.idm_type);
            prop_assert_eq!(merged_type, over_type.or(base_type));
        }
    }

    /// Property: the merge fails exactly when a mandatory issuer field is
    /// unset on both sides
    #[test]
    fn prop_missing_issuer_fields_fail(base in iam(), over in iam()) {
        let url_set = [&base, &over]
            .iter()
            .any(|c| c.issuer_config.as_ref().and_then(|i| i.url.as_ref()).is_some());
        let client_set = [&base, &over]
            .iter()
            .any(|c| c.issuer_config.as_ref().and_then(|i| i.client_id.as_ref()).is_some());

        let result = merge_iam_config(Some(&base), Some(&over));
        if url_set && client_set {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(MergeError::MissingField { .. })), "expected MissingField, got {:?}", result);
        }
    }
}
