// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the submission gate service.
//!
//! The transport layer only assembles a [`SubmissionRequest`] and maps the
//! gate's decision to a response; every check lives in [`crate::gate`].

use crate::config::Config;
use crate::error::GateError;
use crate::form::{FormId, FormRegistry};
use crate::gate::{GateDecision, SubmissionGate};
use crate::submission::{field_text, parse_form_body, parse_json_body, SubmissionRequest};
use axum::{
    body::Bytes,
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Shared application state.
pub struct AppState {
    pub registry: FormRegistry,
    pub gate: SubmissionGate,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/f/:form_id", post(submit_form))
        .route("/f/:form_id/thank-you", get(thank_you));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "submission-gate",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Receive one form submission.
///
/// Accepted and silently dropped submissions both get a 303 to the form's
/// destination; rejections get a generic 403.
pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    Path(form_id): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Redirect, GateError> {
    let form_id = FormId::from(form_id);
    let form = state
        .registry
        .get(&form_id)
        .ok_or_else(|| GateError::FormNotFound(form_id.clone()))?;

    let fields = if is_json(&headers) {
        parse_json_body(&body)?
    } else {
        parse_form_body(&body)
    };

    let request = SubmissionRequest {
        captcha_token: field_text(&fields, &state.config.captcha.token_field)
            .map(|token| token.into_owned()),
        fields,
        referrer: header_text(&headers, header::REFERER),
        remote_ip: client_ip(
            &headers,
            connect_info.map(|ConnectInfo(addr)| addr),
            state.config.trust_forwarded_for,
        ),
        user_agent: header_text(&headers, header::USER_AGENT),
    };

    debug!(
        form_id = %form.id,
        fields = request.fields.len(),
        has_token = request.captcha_token.is_some(),
        "Received submission"
    );

    let outcome = state.gate.submit(&form, request).await?;

    if let Some(fanout) = outcome.fanout {
        let metrics = state.gate.metrics().clone();
        tokio::spawn(async move {
            match fanout.await {
                Ok(report) => metrics.record_fanout(&report),
                Err(err) => error!(error = %err, "Notification fan-out panicked"),
            }
        });
    }

    match outcome.decision {
        GateDecision::Reject(reason) => Err(GateError::Rejected(reason)),
        GateDecision::Accept | GateDecision::SilentDrop(_) => {
            let destination = outcome
                .redirect
                .unwrap_or_else(|| state.gate.redirect_for(&form));
            Ok(Redirect::to(&destination))
        }
    }
}

/// Default acknowledgement page.
pub async fn thank_you(
    State(state): State<Arc<AppState>>,
    Path(form_id): Path<String>,
) -> Result<Html<&'static str>, GateError> {
    let form_id = FormId::from(form_id);
    if state.registry.get(&form_id).is_none() {
        return Err(GateError::FormNotFound(form_id));
    }
    Ok(Html(THANK_YOU_PAGE))
}

const THANK_YOU_PAGE: &str = "<!DOCTYPE html>\n\
<html lang=\"en\">\n\
<head><meta charset=\"utf-8\"><title>Thank you</title></head>\n\
<body><h1>Thanks for your submission!</h1></body>\n\
</html>\n";

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.gate.metrics().render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Client address: the socket peer, or the first `X-Forwarded-For` hop
/// when the service sits behind a trusted proxy.
fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> Option<String> {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }
    }
    peer.map(|addr| addr.ip().to_string())
}
