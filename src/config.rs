//! User settings for fincore.
//!
//! A single mutable record holding the remote endpoint address, opening
//! balances and the daily spending limit. Settings are local-only: they are
//! read once at engine start, written on explicit save through the store,
//! and have no merge semantics.

use serde::{Deserialize, Serialize};

fn default_daily_limit() -> f64 {
    500_000.0
}

/// Application settings.
///
/// An empty `script_url` means remote sync is disabled; any non-empty value
/// is treated as the active remote endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Remote endpoint URL (Apps Script web app). Empty = sync disabled.
    #[serde(default)]
    pub script_url: String,
    /// Opening cash balance
    #[serde(default)]
    pub initial_balance: f64,
    /// Opening bank balance
    #[serde(default)]
    pub initial_bank_balance: f64,
    /// Daily spending limit
    #[serde(default = "default_daily_limit")]
    pub daily_limit: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            script_url: String::new(),
            initial_balance: 0.0,
            initial_bank_balance: 0.0,
            daily_limit: default_daily_limit(),
        }
    }
}

impl Settings {
    /// The active remote endpoint, if sync is enabled.
    pub fn endpoint(&self) -> Option<String> {
        if self.script_url.trim().is_empty() {
            None
        } else {
            Some(self.script_url.clone())
        }
    }

    /// Whether remote sync is configured.
    pub fn sync_enabled(&self) -> bool {
        self.endpoint().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.daily_limit, 500_000.0);
        assert_eq!(settings.initial_balance, 0.0);
        assert!(!settings.sync_enabled());
        assert!(settings.endpoint().is_none());
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_endpoint_ignores_whitespace() {
        let settings = Settings {
            script_url: "   ".to_string(),
            ..Settings::default()
        };
        assert!(settings.endpoint().is_none());

        let settings = Settings {
            script_url: "https://script.google.com/macros/s/abc/exec".to_string(),
            ..Settings::default()
        };
        assert!(settings.sync_enabled());
    }
}
