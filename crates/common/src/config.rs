//! Logging configuration shared by the credential check binaries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default `EnvFilter` directive when `RUST_LOG` is not set.
///
/// Library events use dotted targets (`vc.checks.org`, `common.jwt`); the
/// binary logs under its module path `vc_check`.
pub const DEFAULT_LOG_LEVEL: &str = "vc=info,common=info,vc_check=info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable single-line output.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Filter directive (trace, debug, info, warn, error, or per-target directives)
    pub log_level: String,
    /// Output format for log events
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ObservabilityConfig {
    /// Read `RUST_LOG` and `LOG_FORMAT` from a variable map.
    ///
    /// Unknown `LOG_FORMAT` values fall back to text output.
    #[must_use]
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let log_level = vars
            .get("RUST_LOG")
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let log_format = match vars.get("LOG_FORMAT").map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            log_level,
            log_format,
        }
    }
}
