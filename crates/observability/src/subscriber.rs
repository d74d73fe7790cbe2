//! JSON subscriber with an env-configurable filter.

use tracing_subscriber::EnvFilter;

/// Directives used when none are configured.
pub const DEFAULT_FILTER: &str = "info";

pub(crate) fn init_from_env() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter);
}

/// Initialize with explicit directives, e.g. `"bankconsole_console=debug,info"`.
///
/// Directives that do not parse fall back to [`DEFAULT_FILTER`].
pub fn init_with_filter(directives: &str) {
    let (filter, rejected) = match EnvFilter::try_new(directives) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new(DEFAULT_FILTER), Some(err)),
    };
    install(filter);
    if let Some(err) = rejected {
        tracing::warn!(directives, error = %err, "invalid log filter; using default");
    }
}

fn install(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init();
}
