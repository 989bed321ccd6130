//! Integration test crate for the haggle negotiation pipeline.
//!
//! This crate exists solely to run tests that span multiple haggle crates;
//! its only library surface is the shared logging hook below.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use tracing_subscriber::EnvFilter;

/// Installs a `RUST_LOG`-driven subscriber for the current test binary.
///
/// Safe to call from every test; installs are attempted once and later calls
/// are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
