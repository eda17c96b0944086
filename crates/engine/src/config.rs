//! Engine configuration.
//!
//! One flat option set covers every component. It deserializes with serde
//! (unknown keys are rejected) or loads from `CLOSET_<KEY>` environment
//! variables, e.g. `CLOSET_MAX_HISTORY=250`.

use serde::{Deserialize, Serialize};

use closet_decoration::DecorationOptions;
use closet_events::BusOptions;
use closet_filters::FilterOptions;

/// Prefix of the environment variables read by [`EngineOptions::from_env`].
pub const ENV_PREFIX: &str = "CLOSET_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    pub auto_sort_by_priority: bool,
    pub log_events: bool,
    pub log_decorations: bool,
    pub log_filters: bool,
    pub skip_invalid: bool,
    pub max_history: usize,
    pub validate_values: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            auto_sort_by_priority: true,
            log_events: true,
            log_decorations: true,
            log_filters: true,
            skip_invalid: true,
            max_history: 100,
            validate_values: true,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl EngineOptions {
    /// Reads `CLOSET_<KEY>` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads options through `lookup`, which receives full variable names.
    ///
    /// Missing variables keep their defaults. Unparsable ones are logged and
    /// keep their defaults too.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        let read = |key: &str| lookup(&format!("{ENV_PREFIX}{key}")).map(|raw| (key.to_string(), raw));

        let flags: [(&str, &mut bool); 6] = [
            ("AUTO_SORT_BY_PRIORITY", &mut options.auto_sort_by_priority),
            ("LOG_EVENTS", &mut options.log_events),
            ("LOG_DECORATIONS", &mut options.log_decorations),
            ("LOG_FILTERS", &mut options.log_filters),
            ("SKIP_INVALID", &mut options.skip_invalid),
            ("VALIDATE_VALUES", &mut options.validate_values),
        ];
        for (key, slot) in flags {
            if let Some((key, raw)) = read(key) {
                match parse_flag(&raw) {
                    Some(value) => *slot = value,
                    None => tracing::warn!(key = %key, value = %raw, "unparsable flag, keeping default"),
                }
            }
        }

        if let Some((key, raw)) = read("MAX_HISTORY") {
            match raw.trim().parse::<usize>() {
                Ok(value) => options.max_history = value,
                Err(err) => tracing::warn!(key = %key, value = %raw, error = %err, "unparsable number, keeping default"),
            }
        }

        options
    }

    pub fn bus_options(&self) -> BusOptions {
        BusOptions {
            log_events: self.log_events,
            max_history: self.max_history,
            skip_invalid: self.skip_invalid,
        }
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            log_filters: self.log_filters,
            validate_values: self.validate_values,
            skip_invalid: self.skip_invalid,
        }
    }

    pub fn decoration_options(&self) -> DecorationOptions {
        DecorationOptions {
            auto_sort_by_priority: self.auto_sort_by_priority,
            log_decorations: self.log_decorations,
            skip_invalid: self.skip_invalid,
        }
    }
}
