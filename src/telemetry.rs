// Copyright (c) 2025 - Cowboy AI, Inc.
//! Tracing setup for processes embedding this crate

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_level`.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(default_level: LevelFilter) -> bool {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
