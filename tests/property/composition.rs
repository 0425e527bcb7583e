// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for value composition

use metal_provider_core::values::{
    AccountingValues, AuthnValues, ComposedValues, ControllerManagerValues, LimitWebhookValues,
    ValueGroup,
};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn text() -> impl Strategy<Value = String> {
    "[a-z0-9-]{0,12}"
}

fn groups() -> impl Strategy<Value = Vec<ValueGroup>> {
    (
        (0u32..4, text(), text(), proptest::option::of(any::<bool>())),
        (text(), text(), any::<bool>()),
        (text(), text(), text()),
        any::<bool>(),
    )
        .prop_map(|(controller_manager, authn, accounting, validate)| {
            let (replicas, project, network, gate) = controller_manager;
            let (tenant, name, debug) = authn;
            let (url, hmac, project_name) = accounting;
            vec![
                ValueGroup::ControllerManager(ControllerManagerValues {
                    replicas,
                    project_id: project.clone(),
                    network_id: network,
                    feature_gates: gate.map(|g| BTreeMap::from([("Gate".to_string(), g)])),
                    ..Default::default()
                }),
                ValueGroup::Authn(AuthnValues {
                    tenant: tenant.clone(),
                    cluster_name: name.clone(),
                    debug,
                    ..Default::default()
                }),
                ValueGroup::Accounting(AccountingValues {
                    tenant,
                    cluster_name: name,
                    project_id: project,
                    project_name,
                    sink_url: url,
                    sink_hmac: hmac,
                    ..Default::default()
                }),
                ValueGroup::LimitWebhook(LimitWebhookValues { validate }),
            ]
        })
}

proptest! {
    /// Property: merging producer outputs in any order yields the same map
    #[test]
    fn prop_composition_is_order_independent(
        (ordered, shuffled) in groups().prop_flat_map(|g| (Just(g.clone()), Just(g).prop_shuffle()))
    ) {
        let a = ComposedValues::from_groups(ordered).unwrap();
        let b = ComposedValues::from_groups(shuffled).unwrap();
        prop_assert_eq!(a.to_json_bytes().unwrap(), b.to_json_bytes().unwrap());
    }

    /// Property: no key is written by two groups
    #[test]
    fn prop_groups_write_disjoint_keys(g in groups()) {
        let mut seen = BTreeSet::new();
        for group in &g {
            for (key, _) in group.entries() {
                prop_assert!(seen.insert(key), "key {} written twice", key);
            }
        }
        prop_assert_eq!(ComposedValues::from_groups(g).unwrap().len(), seen.len());
    }

    /// Property: a repeated group is always rejected
    #[test]
    fn prop_repeated_group_rejected(g in groups(), index in 0usize..4) {
        let mut doubled = g.clone();
        doubled.push(g[index].clone());
        prop_assert!(ComposedValues::from_groups(doubled).is_err());
    }
}
