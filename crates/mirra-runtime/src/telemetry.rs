//! Logging setup

use tracing_subscriber::EnvFilter;

use crate::LogConfig;

/// Install a global fmt subscriber for `config`.
///
/// Returns false if a global subscriber was already installed; the
/// existing one is left in place.
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {:?}: {err}, falling back to info", config.filter);
        EnvFilter::new("info")
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}
