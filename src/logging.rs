//! Tracing setup for embedding programs.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global stderr subscriber. The level acts as the default
/// directive; `RUST_LOG` overrides it. Safe to call more than once, later
/// calls are ignored.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_reentrant() {
        init_logging("debug");
        init_logging("warn");
    }
}
