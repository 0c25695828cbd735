// hostmon Library - Public API

// Re-export error types
pub mod error;
pub use error::{MonitorError, Result};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use core::config::Config;
pub use core::system_monitor::{MetricsCollector, MetricsSnapshot};

/// Initialize logging.
///
/// `RUST_LOG` wins when set; otherwise `level` (e.g. from the config file) is
/// used, defaulting to warnings only.
pub fn init_logging(level: Option<&str>) {
    let mut builder = env_logger::Builder::new();

    if std::env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    } else {
        builder.filter_level(parse_level(level));
    }

    // a second call keeps the first logger
    let _ = builder.try_init();
}

fn parse_level(level: Option<&str>) -> log::LevelFilter {
    level
        .and_then(|l| l.parse().ok())
        .unwrap_or(log::LevelFilter::Warn)
}
