//! Tracing subscriber installation.
//!
//! The engine crates only emit events through `tracing` macros. Whoever owns
//! the process decides where they go by calling [`init`] or [`init_with`] once
//! at start-up. Both are safe to call again: later calls leave the first
//! subscriber in place.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directives used when `RUST_LOG` is unset or unparsable.
    pub default_directives: String,
    pub format: LogFormat,
    pub with_target: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_directives: "info".to_string(),
            format: LogFormat::Json,
            with_target: false,
        }
    }
}

impl LogSettings {
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.default_directives))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// JSON logs at `info`, overridable through `RUST_LOG`.
pub fn init() -> bool {
    init_with(&LogSettings::default())
}

/// Installs the global subscriber described by `settings`.
///
/// Returns false when a global subscriber was already installed.
pub fn init_with(settings: &LogSettings) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.env_filter())
        .with_target(settings.with_target);

    match settings.format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Pretty => builder.pretty().try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        let _ = init();
        assert!(!init());
        assert!(!init_with(&LogSettings {
            format: LogFormat::Pretty,
            ..LogSettings::default()
        }));
        ::tracing::info!(component = "observability", "still logging after repeated init");
    }

    #[test]
    fn bad_default_directives_fall_back() {
        let settings = LogSettings {
            default_directives: "[[not a directive".to_string(),
            ..LogSettings::default()
        };
        let _filter = settings.env_filter();
    }

    #[test]
    fn settings_deserialize_partially() {
        let s: LogSettings = serde_json::from_str(r#"{"format": "pretty"}"#).unwrap();
        assert_eq!(s.format, LogFormat::Pretty);
        assert_eq!(s.default_directives, "info");
        assert!(!s.with_target);
    }
}
