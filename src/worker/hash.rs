// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stable fingerprint of a worker pool

use semver::Version;
use sha2::{Digest, Sha256};

use super::PlanError;
use crate::cluster::{Cluster, IntOrString, WorkerPool};

/// Length of the hex fingerprint embedded in class names
pub const POOL_HASH_LENGTH: usize = 5;

/// Fingerprint over the rollout-relevant inputs of `pool`.
///
/// Inputs: pool name, machine type, image name and version, the four scaling
/// bounds, user data and the cluster's Kubernetes `major.minor`. Labels,
/// annotations, taints and cluster annotations do not take part.
pub fn pool_hash(pool: &WorkerPool, cluster: &Cluster) -> Result<String, PlanError> {
    let version = kubernetes_minor_version(&cluster.shoot.kubernetes_version)?;

    let mut hasher = Sha256::new();
    for field in [
        pool.name.as_bytes(),
        pool.machine_type.as_bytes(),
        pool.machine_image.name.as_bytes(),
        pool.machine_image.version.as_bytes(),
        pool.minimum.to_string().as_bytes(),
        pool.maximum.to_string().as_bytes(),
        scaling_bound(&pool.max_surge).as_bytes(),
        scaling_bound(&pool.max_unavailable).as_bytes(),
        pool.user_data.as_slice(),
        version.as_bytes(),
    ] {
        // length prefix keeps ("ab", "c") apart from ("a", "bc")
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field);
    }

    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(POOL_HASH_LENGTH);
    Ok(digest)
}

/// Tagged with the variant so `3` and `"3"` encode differently
fn scaling_bound(value: &IntOrString) -> String {
    match value {
        IntOrString::Int(count) => format!("i:{}", count),
        IntOrString::String(text) => format!("s:{}", text),
    }
}

fn kubernetes_minor_version(raw: &str) -> Result<String, PlanError> {
    let trimmed = raw.trim_start_matches('v');
    let version = Version::parse(trimmed).map_err(|e| PlanError::InvalidKubernetesVersion {
        version: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(format!("{}.{}", version.major, version.minor))
}
