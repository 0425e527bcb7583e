// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for worker pool fingerprints

use metal_provider_core::cluster::{IntOrString, WorkerPool};
use metal_provider_core::worker::pool_hash;
use proptest::prelude::*;

use crate::fixtures::{cluster, pool};

fn worker_pool() -> impl Strategy<Value = WorkerPool> {
    (
        "[a-z][a-z0-9-]{0,10}",
        "[a-z0-9-]{1,12}",
        0i32..20,
        0i32..20,
        0i32..5,
        proptest::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(name, machine_type, minimum, extra, surge, user_data)| WorkerPool {
            name,
            machine_type,
            minimum,
            maximum: minimum + extra,
            max_surge: IntOrString::Int(surge),
            user_data,
            ..pool()
        })
}

proptest! {
    /// Property: the hash is a pure function of its inputs
    #[test]
    fn prop_hash_is_deterministic(p in worker_pool()) {
        let c = cluster();
        prop_assert_eq!(pool_hash(&p, &c).unwrap(), pool_hash(&p.clone(), &c.clone()).unwrap());
    }

    /// Property: changing only the machine type changes the hash
    #[test]
    fn prop_machine_type_changes_hash(p in worker_pool(), suffix in "[a-z]{1,4}") {
        let c = cluster();
        let mut changed = p.clone();
        changed.machine_type = format!("{}{}", p.machine_type, suffix);
        prop_assert_ne!(pool_hash(&p, &c).unwrap(), pool_hash(&changed, &c).unwrap());
    }

    /// Property: cluster annotations take no part in the hash
    #[test]
    fn prop_cluster_annotation_keeps_hash(
        p in worker_pool(),
        key in "[a-z./]{1,20}",
        value in "[a-z0-9]{0,12}",
    ) {
        let c = cluster();
        let mut annotated = c.clone();
        annotated.shoot.annotations.insert(key, value);
        prop_assert_eq!(pool_hash(&p, &c).unwrap(), pool_hash(&p, &annotated).unwrap());
    }

    /// Property: pool labels and taints take no part in the hash
    #[test]
    fn prop_pool_labels_keep_hash(p in worker_pool(), key in "[a-z]{1,8}", value in "[a-z]{0,8}") {
        let c = cluster();
        let mut labeled = p.clone();
        labeled.labels.insert(key, value);
        prop_assert_eq!(pool_hash(&p, &c).unwrap(), pool_hash(&labeled, &c).unwrap());
    }
}
