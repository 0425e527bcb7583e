// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for provider-config decoding

use metal_provider_core::apis::{
    CloudControllerManagerConfig, ControlPlaneConfig, IamConfig, InfrastructureConfig, IssuerConfig,
};
use metal_provider_core::scheme::ConfigScheme;
use proptest::prelude::*;
use std::collections::BTreeMap;

use crate::fixtures::iam_config;

fn control_plane_config() -> impl Strategy<Value = ControlPlaneConfig> {
    (
        proptest::option::of(proptest::collection::btree_map(
            "[A-Za-z]{1,16}",
            any::<bool>(),
            0..4,
        )),
        proptest::option::of((
            proptest::option::of("[a-z:/.]{1,20}"),
            proptest::option::of("[a-z-]{1,12}"),
        )),
        any::<bool>(),
    )
        .prop_map(|(gates, issuer, with_defaults)| ControlPlaneConfig {
            cloud_controller_manager: gates.map(|g: BTreeMap<String, bool>| {
                CloudControllerManagerConfig {
                    feature_gates: Some(g),
                }
            }),
            iam_config: match (issuer, with_defaults) {
                (Some((url, client_id)), _) => Some(IamConfig {
                    issuer_config: Some(IssuerConfig { url, client_id }),
                    ..Default::default()
                }),
                (None, true) => Some(iam_config()),
                (None, false) => None,
            },
        })
}

proptest! {
    /// Property: decode is the inverse of encode for control-plane configs
    #[test]
    fn prop_control_plane_round_trip(config in control_plane_config()) {
        let scheme = ConfigScheme::standard();
        let bytes = scheme.encode(&config).unwrap();
        let decoded: ControlPlaneConfig = scheme.decode(Some(&bytes)).unwrap();
        prop_assert_eq!(decoded, config);
    }

    /// Property: infrastructure configs survive a round trip
    #[test]
    fn prop_infrastructure_round_trip(
        partition in "[a-z0-9-]{1,12}",
        project in "[a-z0-9-]{1,36}",
    ) {
        let scheme = ConfigScheme::standard();
        let config = InfrastructureConfig {
            partition_id: partition,
            project_id: project,
            ..Default::default()
        };
        let bytes = scheme.encode(&config).unwrap();
        let decoded: InfrastructureConfig = scheme.decode(Some(&bytes)).unwrap();
        prop_assert_eq!(decoded, config);
    }

    /// Property: arbitrary bytes never panic the decoder
    #[test]
    fn prop_garbage_is_an_error_not_a_panic(
        bytes in proptest::collection::vec(any::<u8>(), 1..64),
    ) {
        let scheme = ConfigScheme::standard();
        let _ = scheme.decode::<ControlPlaneConfig>(Some(&bytes));
    }
}
