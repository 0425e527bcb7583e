// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Algebraic properties of the pipeline: merge idempotence, pool hash
//! stability, composition order independence, decode round-trips and CIDR
//! containment.

mod composition;
mod config_merge;
mod decoding;
mod network;
mod pool_hashing;
