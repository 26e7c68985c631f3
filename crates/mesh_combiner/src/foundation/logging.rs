//! Logging utilities

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging, falling back to `default_level` when `RUST_LOG` is unset
///
/// Safe to call more than once; later calls are ignored.
pub fn init_with_level(default_level: log::LevelFilter) {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(default_level)
        .parse_default_env()
        .try_init();
}
