//! Tracing subscriber initialization driven by the logging config.

use noteshare_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the configured level
/// applies to the noteshare crates and `info` to everything else. Safe to
/// call more than once (later calls are no-ops), which keeps tests simple.
pub fn init(config: &LoggingConfig) {
    let default_directives = format!(
        "info,noteshare_api={level},noteshare_store={level},noteshare_core={level}",
        level = config.level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    let result = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already initialized");
    }
}
