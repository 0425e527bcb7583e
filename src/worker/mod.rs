// Copyright (c) 2025 - Cowboy AI, Inc.
//! Worker pool planning
//!
//! Turns the worker pools of a cluster into machine classes and machine
//! deployments. Every class name embeds [`pool_hash`], so a pool is only
//! rolled when a rollout-relevant input changes.
//!
//! # Naming
//!
//! ```text
//! deployment = {namespace}-{pool}
//! class      = {namespace}-{pool}-{hash}
//! secret     = class
//! ```

pub mod hash;
pub mod machines;

pub use hash::pool_hash;
pub use machines::{
    MachineClassSecret, MachineClassSpec, MachineDeployment, MachinePlan, MachinePlanner,
    WorkerDelegate, MACHINE_CLASS_CHART, MACHINE_CLASS_KIND,
};

use thiserror::Error;

/// Planning failures, each naming the pool it concerns
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("pool {pool}: machine image {name}@{version} is not in the image mapping")]
    ImageNotFound {
        pool: String,
        name: String,
        version: String,
    },

    #[error("invalid kubernetes version {version:?}: {reason}")]
    InvalidKubernetesVersion { version: String, reason: String },

    #[error("nodeCIDR was not yet set by infrastructure controller")]
    MissingNodeCidr,
}
