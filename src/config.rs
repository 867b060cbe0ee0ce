// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the submission gate service.
//!
//! Per-form settings (allowed domains, honeypot, captcha secret, block-list,
//! recipients) live in the forms file, see [`crate::form`]. This module only
//! covers process-wide settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the submission gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Path of the JSON forms file (default: forms.json)
    #[serde(default = "default_forms_path")]
    pub forms_path: String,

    /// Prefix for the default acknowledgement location, e.g.
    /// `https://forms.example.org`. Relative redirects when unset.
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Take the client address from `X-Forwarded-For` (default: false)
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Captcha verification configuration
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Notification configuration
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Captcha verification service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    /// Verification endpoint (default: Cloudflare Turnstile siteverify)
    #[serde(default = "default_verify_url")]
    pub verify_url: String,

    /// Upper bound on the verification call in milliseconds (default: 5000)
    #[serde(default = "default_captcha_timeout_ms")]
    pub timeout_ms: u64,

    /// Submission field carrying the challenge token
    #[serde(default = "default_token_field")]
    pub token_field: String,
}

/// Notification fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Per-recipient delivery timeout in milliseconds (default: 10000)
    #[serde(default = "default_notify_timeout_ms")]
    pub timeout_ms: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_forms_path() -> String {
    "forms.json".to_string()
}

fn default_verify_url() -> String {
    "https://challenges.cloudflare.com/turnstile/v0/siteverify".to_string()
}

fn default_captcha_timeout_ms() -> u64 {
    5000
}

fn default_token_field() -> String {
    "cf-turnstile-response".to_string()
}

fn default_notify_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            forms_path: default_forms_path(),
            public_base_url: None,
            trust_forwarded_for: false,
            captcha: CaptchaConfig::default(),
            notify: NotifyConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            verify_url: default_verify_url(),
            timeout_ms: default_captcha_timeout_ms(),
            token_field: default_token_field(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_notify_timeout_ms(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl CaptchaConfig {
    /// Get the verification timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl NotifyConfig {
    /// Get the per-recipient delivery timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from environment variables on top of defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            forms_path: lookup("FORMS_PATH").unwrap_or(defaults.forms_path),
            public_base_url: lookup("PUBLIC_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
            trust_forwarded_for: parse_var(&lookup, "TRUST_FORWARDED_FOR")
                .unwrap_or(defaults.trust_forwarded_for),
            captcha: CaptchaConfig {
                verify_url: lookup("CAPTCHA_VERIFY_URL").unwrap_or(defaults.captcha.verify_url),
                timeout_ms: parse_var(&lookup, "CAPTCHA_TIMEOUT_MS")
                    .unwrap_or(defaults.captcha.timeout_ms),
                token_field: lookup("CAPTCHA_TOKEN_FIELD")
                    .unwrap_or(defaults.captcha.token_field),
            },
            notify: NotifyConfig {
                timeout_ms: parse_var(&lookup, "NOTIFY_TIMEOUT_MS")
                    .unwrap_or(defaults.notify.timeout_ms),
            },
            metrics: MetricsConfig {
                enabled: parse_var(&lookup, "METRICS_ENABLED")
                    .unwrap_or(defaults.metrics.enabled),
                ..defaults.metrics
            },
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
