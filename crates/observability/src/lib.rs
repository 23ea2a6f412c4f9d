//! Process-wide logging setup for hosts embedding the engine.

use warden_core::AuthConfig;

/// Subscriber construction (filters, JSON output).
pub mod subscriber;

/// Initialize logging with the `info` default filter.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    subscriber::init("info");
}

/// Initialize logging with the configured default filter.
///
/// `RUST_LOG` still takes precedence when set.
pub fn init_with(config: &AuthConfig) {
    subscriber::init(&config.log_filter);
}
