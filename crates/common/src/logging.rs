//! Logging and tracing initialization.

use crate::config::LoggingConfig;

/// Log target used for raw transcoder diagnostic output, so ffmpeg noise
/// can be filtered independently (e.g. `RUST_LOG=matchcut=info,ffmpeg=off`).
pub const TRANSCODER_LOG_TARGET: &str = "ffmpeg";

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` overrides the configured level filter when set.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(config.show_targets)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

/// Initialize logging with defaults (useful for tests and quick scripts).
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default());
}
