//! Session configuration

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const ENV_ISOLATE_WATCHER_PANICS: &str = "MIRRA_ISOLATE_WATCHER_PANICS";
pub const ENV_LOG: &str = "MIRRA_LOG";
pub const ENV_LOG_JSON: &str = "MIRRA_LOG_JSON";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives, e.g. `info,mirra_state=trace`
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Catch and log panicking watch callbacks instead of unwinding through
    /// the dispatcher
    pub isolate_watcher_panics: bool,
    pub log: LogConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            isolate_watcher_panics: true,
            log: LogConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_isolate_watcher_panics(mut self, isolate: bool) -> Self {
        self.isolate_watcher_panics = isolate;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log.filter = filter.into();
        self
    }

    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.log.json = json;
        self
    }

    /// Defaults overridden by `MIRRA_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = SessionConfig::default();

        if let Some(isolate) = lookup(ENV_ISOLATE_WATCHER_PANICS).and_then(|v| parse_flag(ENV_ISOLATE_WATCHER_PANICS, &v)) {
            config.isolate_watcher_panics = isolate;
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            config.log.filter = filter;
        }
        if let Some(json) = lookup(ENV_LOG_JSON).and_then(|v| parse_flag(ENV_LOG_JSON, &v)) {
            config.log.json = json;
        }

        config
    }
}

fn parse_flag(name: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            warn!(variable = name, value = other, "ignoring unrecognized boolean");
            None
        }
    }
}
