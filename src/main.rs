// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission Gate Service
//!
//! Receives form submissions at `POST /f/:form_id`, filters spam and
//! unauthorized origins, stores what survives and notifies the form owner.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file is
//! read first if present):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `FORMS_PATH`: JSON file with form definitions (default: forms.json)
//! - `PUBLIC_BASE_URL`: Absolute prefix for acknowledgement redirects
//! - `TRUST_FORWARDED_FOR`: Take the client IP from `X-Forwarded-For` (default: false)
//! - `CAPTCHA_VERIFY_URL`: Captcha verification endpoint (default: Turnstile siteverify)
//! - `CAPTCHA_TIMEOUT_MS`: Verification timeout in milliseconds (default: 5000)
//! - `NOTIFY_TIMEOUT_MS`: Per-recipient delivery timeout in milliseconds (default: 10000)
//! - `METRICS_ENABLED`: Expose Prometheus metrics (default: true)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use submission_gate::{
    captcha::CaptchaVerifier,
    config::Config,
    handlers::{router, AppState},
    metrics::GateMetrics,
    FormRegistry, LogNotifier, MemoryStore, NotificationFanout, SubmissionGate, SubmissionStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        forms_path = %config.forms_path,
        captcha_verify_url = %config.captcha.verify_url,
        metrics_enabled = config.metrics.enabled,
        "Starting submission gate"
    );

    let registry = FormRegistry::load(&config.forms_path)?;

    let store: Arc<dyn SubmissionStore> = Arc::new(MemoryStore::new());
    let seeded = registry.seed_block_lists(store.as_ref())?;
    info!(blocked_emails = seeded, "Seeded block-lists");

    let captcha = CaptchaVerifier::new(&config.captcha)?;
    let fanout = NotificationFanout::new(Arc::new(LogNotifier), config.notify.timeout());
    let gate = SubmissionGate::new(store, captcha, fanout, GateMetrics::new()?)
        .with_public_base_url(config.public_base_url.clone());

    let state = Arc::new(AppState {
        registry,
        gate,
        config: config.clone(),
    });
    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
