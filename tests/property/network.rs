// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for CIDR containment

use metal_provider_core::network::CidrPrefix;
use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr};

fn ipv4_prefix() -> impl Strategy<Value = CidrPrefix> {
    (any::<u32>(), 0u8..=32).prop_map(|(address, length)| {
        CidrPrefix::from_parts(IpAddr::V4(Ipv4Addr::from(address)), length).unwrap()
    })
}

proptest! {
    /// Property: no prefix is a strict superset of itself
    #[test]
    fn prop_strict_superset_is_irreflexive(p in ipv4_prefix()) {
        prop_assert!(!p.is_strict_superset_of(&p));
        prop_assert!(p.contains(&p));
    }

    /// Property: shortening a prefix yields a strict superset
    #[test]
    fn prop_shorter_prefix_covers(p in ipv4_prefix(), shorten in 1u8..=32) {
        prop_assume!(p.prefix_length() >= shorten);
        let outer = CidrPrefix::from_parts(p.network(), p.prefix_length() - shorten).unwrap();
        prop_assert!(outer.is_strict_superset_of(&p));
        prop_assert!(!p.is_strict_superset_of(&outer));
    }

    /// Property: display and parse agree
    #[test]
    fn prop_display_parses_back(p in ipv4_prefix()) {
        prop_assert_eq!(p.to_string().parse::<CidrPrefix>().unwrap(), p);
    }
}
