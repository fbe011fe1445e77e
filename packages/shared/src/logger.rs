//! Logging setup utilities for the tamariba binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The default directives cover the crate the binary was built from plus the
/// server library crate, so both `tamariba-server` and `tamariba-client` get
/// useful output out of the box. The `RUST_LOG` environment variable overrides
/// everything.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "tamariba-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let default_directives = format!(
        "{}={},tamariba_server={},tamariba_client={}",
        binary_name.replace('-', "_"),
        default_log_level,
        default_log_level,
        default_log_level,
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
