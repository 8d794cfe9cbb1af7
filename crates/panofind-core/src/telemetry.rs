use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber filtered by `RUST_LOG`, or by `default_level`
/// when `RUST_LOG` is unset or invalid.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(default_level: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_ok()
}
