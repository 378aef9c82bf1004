//! Runtime configuration.
//!
//! Values come from the process environment (after `.env` is loaded), then
//! from the config bundled into the binary, then from built-in defaults.

use crate::reveal::RevealSettings;
use crate::session::SessionSettings;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Duration;
use thiserror::Error;

/// Bundled config for builds that ship without a `.env` (mobile, web)
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

pub const BACKEND_URL: &str = "ELLO_BACKEND_URL";
pub const REVEAL_INTERVAL_MS: &str = "ELLO_REVEAL_INTERVAL_MS";
pub const REVEAL_STRIDE: &str = "ELLO_REVEAL_STRIDE";
pub const ATTACH_CITATIONS_EARLY: &str = "ELLO_ATTACH_CITATIONS_EARLY";
pub const TRACE: &str = "ELLO_TRACE";
pub const SAMPLE_RESPONSES: &str = "ELLO_SAMPLE_RESPONSES";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend_url: String,
    pub reveal: RevealSettings,
    /// Attach citations when the reveal starts instead of when it finishes.
    pub attach_citations_early: bool,
    /// Start with the debug endpoint selected.
    pub trace: bool,
    /// Start with canned backend answers requested.
    pub sample_responses: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            reveal: RevealSettings::default(),
            attach_citations_early: false,
            trace: false,
            sample_responses: false,
        }
    }
}

impl AppConfig {
    /// Load `.env` if present and read the configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        let bundled = parse_env_lines(BUNDLED_CONFIG);
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| bundled.get(key).cloned())
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string());

        let backend_url = match value(BACKEND_URL) {
            Some(url) if url.is_empty() => {
                return Err(ConfigError::Invalid {
                    key: BACKEND_URL,
                    value: url,
                    reason: "must not be empty",
                });
            }
            Some(url) => url.trim_end_matches('/').to_string(),
            None => defaults.backend_url,
        };

        let interval = match value(REVEAL_INTERVAL_MS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: REVEAL_INTERVAL_MS,
                        value: raw,
                        reason: "expected a positive number of milliseconds",
                    });
                }
            },
            None => defaults.reveal.interval,
        };

        let stride = match value(REVEAL_STRIDE) {
            Some(raw) => raw
                .parse::<NonZeroUsize>()
                .map_err(|_| ConfigError::Invalid {
                    key: REVEAL_STRIDE,
                    value: raw,
                    reason: "expected a whole number of tokens, at least 1",
                })?,
            None => defaults.reveal.stride,
        };

        Ok(Self {
            backend_url,
            reveal: RevealSettings { interval, stride },
            attach_citations_early: flag(&lookup, ATTACH_CITATIONS_EARLY, defaults.attach_citations_early)?,
            trace: flag(&lookup, TRACE, defaults.trace)?,
            sample_responses: flag(&lookup, SAMPLE_RESPONSES, defaults.sample_responses)?,
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            reveal: self.reveal,
            attach_citations_early: self.attach_citations_early,
            trace: self.trace,
            sample_responses: self.sample_responses,
        }
    }
}

fn load_dotenv() {
    // Local dev: a .env next to the binary; missing is fine
    if let Err(err) = dotenvy::dotenv() {
        tracing::debug!(error = %err, "no .env loaded");
    }
}

fn flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected true/false",
        }),
    }
}

/// Parse `KEY=VALUE` lines, skipping blanks and `#` comments.
fn parse_env_lines(source: &str) -> HashMap<String, String> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}
