//! Logging setup
//!
//! Logs go to stderr so stdout stays free for the status display. The filter
//! comes from RUST_LOG when set. Otherwise logging starts at the default level
//! so config loading is visible, and the configured level is applied once the
//! config has been read.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

pub const DEFAULT_LEVEL: &str = "info";

pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

pub fn init() -> LogHandle {
    let env = std::env::var("RUST_LOG").ok();
    let from_env = env.is_some();
    let (filter, handle) = reload::Layer::new(EnvFilter::new(directive(DEFAULT_LEVEL, env)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    LogHandle {
        filter: handle,
        from_env,
    }
}

impl LogHandle {
    /// Switch to the configured level unless RUST_LOG takes precedence
    pub fn apply_level(&self, level: &str) {
        if self.from_env {
            return;
        }
        if let Err(e) = self.filter.reload(EnvFilter::new(directive(level, None))) {
            tracing::warn!("Failed to apply log level {}: {}", level, e);
        }
    }
}

fn directive(level: &str, rust_log: Option<String>) -> String {
    rust_log.unwrap_or_else(|| format!("recplay={}", level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_wins_over_level() {
        assert_eq!(directive("debug", Some("warn".into())), "warn");
    }

    #[test]
    fn test_level_scoped_to_crate() {
        assert_eq!(directive("debug", None), "recplay=debug");
        assert_eq!(directive(DEFAULT_LEVEL, None), "recplay=info");
    }
}
