//! Tracing subscriber setup.
//!
//! Logs are the only operator-visible channel this worker has, so the
//! subscriber is installed before anything else happens in `main`.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::models::LogConfig;

/// Install the global subscriber: a stdout layer always, plus daily-rolling
/// JSON files (5 kept) when file logs are enabled. `RUST_LOG` overrides the
/// configured level.
pub fn init_tracing(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let stdout_layer = fmt::layer().with_target(true);

    let registry = Registry::default().with(env_filter).with(stdout_layer);

    if config.enable_file_logs {
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("newsvec")
            .filename_suffix("log")
            .max_log_files(5)
            .build(&config.log_dir)
            .expect("failed to create rolling file appender");
        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .json();
        if let Err(e) = registry.with(file_layer).try_init() {
            tolerate_reinit(&e.to_string());
        }
    } else if let Err(e) = registry.try_init() {
        tolerate_reinit(&e.to_string());
    }
}

// try_init fails when a subscriber is already installed, which is routine in
// tests; any other failure at startup is a misconfiguration worth dying for.
fn tolerate_reinit(msg: &str) {
    if !msg.contains("already been set") {
        panic!("failed to initialize tracing: {msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let config = LogConfig::default();
        init_tracing(&config);
        init_tracing(&config);
    }
}
