// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration resolution and value composition for bare-metal clusters
//!
//! The crate is a pure computation stage inside a reconciliation loop. For
//! one cluster it:
//!
//! 1. decodes the versioned provider-config payloads ([`scheme`])
//! 2. merges cloud-profile defaults with control-plane overrides ([`merge`])
//! 3. looks up the private network and project in the inventory ([`inventory`])
//! 4. composes chart values from independent producers ([`values`])
//! 5. plans machine classes and deployments per worker pool ([`worker`])
//! 6. ensures certificate secrets in the workload cluster ([`certificates`])
//!
//! Kubernetes API access is supplied by the caller through the traits in
//! [`client`].

pub mod apis;
pub mod certificates;
pub mod client;
pub mod cluster;
pub mod config;
pub mod errors;
pub mod inventory;
pub mod merge;
pub mod network;
pub mod scheme;
pub mod telemetry;
pub mod values;
pub mod worker;

// Re-export commonly used types
pub use certificates::{CertificateDescriptor, CertificateLifecycle, PkiIssuer};
pub use client::{ChartApplier, SecretReader, WorkloadClusterApi};
pub use config::ControllerConfig;
pub use errors::{ProviderError, ProviderResult};
pub use inventory::{InventoryClient, InventoryConnector, InventoryResolver};
pub use merge::merge_iam_config;
pub use network::CidrPrefix;
pub use scheme::ConfigScheme;
pub use values::{ComposedValues, ControlPlaneValuesProvider, ValueComposer};
pub use worker::{pool_hash, MachinePlan, WorkerDelegate};
