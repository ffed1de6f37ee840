//! Tracing/logging setup shared by binaries and test harnesses.

/// Initialize process-wide tracing from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (format, filters).
pub mod tracing;

pub use crate::tracing::{LogFormat, ObservabilityConfig, init_for_tests, init_with};
