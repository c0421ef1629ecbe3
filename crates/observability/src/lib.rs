//! Process-wide tracing setup shared by the binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, LogSettings};

/// Initialize tracing with explicit settings.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init_with(settings: &LogSettings) {
    tracing::init(settings);
}
