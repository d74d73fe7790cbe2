//! Process-wide logging setup shared by the console binaries.

pub mod subscriber;

pub use subscriber::{DEFAULT_FILTER, init_with_filter};

/// Initialize JSON logging, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    subscriber::init_from_env();
}
