//! Logging setup for hosts that do not install their own logger

use log::LevelFilter;

/// Environment variable raising the log level to `Debug`
pub const DEBUG_ENV_VAR: &str = "SAMPLER_CACHE_DEBUG";

/// Initialize `env_logger` once for the process
///
/// Hosts that already installed a `log` implementation should skip this;
/// a second logger is ignored rather than treated as an error.
pub fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let log_level = level_for(std::env::var_os(DEBUG_ENV_VAR).is_some());

        if env_logger::Builder::new()
            .filter_level(log_level)
            .try_init()
            .is_err()
        {
            log::debug!("Logger already installed, keeping it");
        }
    });
}

fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}
