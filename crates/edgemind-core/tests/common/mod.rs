//! Common test utilities shared across all `edgemind-core` integration tests.
//!
//! This module is **not** a standalone test binary.  It is declared with
//! `mod common;` inside each integration test file that needs it.  Each test
//! binary uses its own subset of the helpers, hence the `dead_code` allow.
#![allow(dead_code)]

pub mod mocks;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a compact log subscriber once per test binary.
///
/// Output goes through the test writer so it only shows with
/// `--nocapture`; the filter respects `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with_test_writer()
            .try_init();
    });
}
