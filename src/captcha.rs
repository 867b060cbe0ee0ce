// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Server-side captcha token verification (Turnstile-compatible siteverify).
//!
//! Fails closed: only an explicit `"success": true` from the verification
//! service passes. Transport errors, timeouts, non-2xx statuses and
//! unparseable bodies all verify as false and are never returned to the
//! caller.

use crate::config::CaptchaConfig;
use crate::form::CaptchaSecret;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Reasons a verification call did not produce a usable answer.
#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Verification request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Verification service returned {0}")]
    Status(StatusCode),

    #[error("Malformed verification response: {0}")]
    Body(#[source] reqwest::Error),
}

/// Response body of the verification service.
#[derive(Debug, Deserialize)]
pub struct SiteVerifyResponse {
    #[serde(default)]
    pub success: Option<bool>,

    #[serde(rename = "error-codes", default)]
    pub error_codes: Vec<String>,
}

/// Captcha verification client.
#[derive(Debug, Clone)]
pub struct CaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
}

impl CaptchaVerifier {
    /// Create a verifier with the configured endpoint and timeout.
    pub fn new(config: &CaptchaConfig) -> Result<Self, CaptchaError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .redirect(Policy::none())
            .build()
            .map_err(CaptchaError::Client)?;

        Ok(Self {
            client,
            verify_url: config.verify_url.clone(),
        })
    }

    pub fn verify_url(&self) -> &str {
        &self.verify_url
    }

    /// Verify a challenge token.
    ///
    /// - no secret configured: passes without any network call
    /// - secret but no token: fails without any network call
    /// - otherwise: passes only on an explicit success from the service
    pub async fn verify(
        &self,
        secret: Option<&CaptchaSecret>,
        token: Option<&str>,
        remote_ip: Option<&str>,
    ) -> bool {
        let secret = match secret {
            Some(s) if !s.is_empty() => s,
            _ => return true,
        };

        let token = match token {
            Some(t) if !t.trim().is_empty() => t,
            _ => {
                debug!("Captcha required but no token supplied");
                return false;
            }
        };

        match self.siteverify(secret, token, remote_ip).await {
            Ok(SiteVerifyResponse {
                success: Some(true),
                ..
            }) => {
                debug!("Captcha token verified");
                true
            }
            Ok(response) => {
                debug!(error_codes = ?response.error_codes, "Captcha token rejected");
                false
            }
            Err(err) => {
                warn!(error = %err, "Captcha verification unavailable, failing closed");
                false
            }
        }
    }

    async fn siteverify(
        &self,
        secret: &CaptchaSecret,
        token: &str,
        remote_ip: Option<&str>,
    ) -> Result<SiteVerifyResponse, CaptchaError> {
        let mut params = vec![("secret", secret.expose()), ("response", token)];
        if let Some(ip) = remote_ip.filter(|ip| !ip.is_empty()) {
            params.push(("remoteip", ip));
        }

        let response = self
            .client
            .post(&self.verify_url)
            .form(&params)
            .send()
            .await
            .map_err(CaptchaError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptchaError::Status(status));
        }

        response
            .json::<SiteVerifyResponse>()
            .await
            .map_err(CaptchaError::Body)
    }
}
