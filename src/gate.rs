// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission gate: decides whether a submission is accepted, silently
//! dropped, or rejected, then persists and notifies on acceptance.
//!
//! Checks run in a fixed order and the first failing one decides:
//!
//! 1. referrer domain: reject (403)
//! 2. honeypot: silent drop
//! 3. captcha: reject (403)
//! 4. blocked sender: silent drop
//!
//! A silent drop answers exactly like an acceptance (same redirect) but
//! stores nothing and notifies no one.

use crate::blocklist::{BlockedSenderChecker, StoredBlockList};
use crate::captcha::CaptchaVerifier;
use crate::form::FormConfig;
use crate::metrics::GateMetrics;
use crate::notify::{FanoutReport, NotificationFanout};
use crate::store::{StoreError, SubmissionStore};
use crate::submission::{SubmissionRecord, SubmissionRequest};
use crate::{honeypot, referrer};
use axum::http::StatusCode;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Why a submission was dropped without feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Honeypot,
    BlockedSender,
}

impl DropReason {
    pub fn label(self) -> &'static str {
        match self {
            Self::Honeypot => "honeypot",
            Self::BlockedSender => "blocked_sender",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Honeypot => write!(f, "honeypot"),
            Self::BlockedSender => write!(f, "blocked sender"),
        }
    }
}

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    DomainNotAllowed,
    CaptchaFailed,
}

impl RejectReason {
    pub fn label(self) -> &'static str {
        match self {
            Self::DomainNotAllowed => "domain_not_allowed",
            Self::CaptchaFailed => "captcha_failed",
        }
    }

    pub fn status(self) -> StatusCode {
        StatusCode::FORBIDDEN
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomainNotAllowed => write!(f, "domain not allowed"),
            Self::CaptchaFailed => write!(f, "captcha failed"),
        }
    }
}

/// Outcome of the check pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Accept,
    SilentDrop(DropReason),
    Reject(RejectReason),
}

impl GateDecision {
    pub fn outcome_label(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::SilentDrop(_) => "silent_drop",
            Self::Reject(_) => "reject",
        }
    }

    pub fn reason_label(&self) -> &'static str {
        match self {
            Self::Accept => "none",
            Self::SilentDrop(reason) => reason.label(),
            Self::Reject(reason) => reason.label(),
        }
    }

    /// Status the client sees. Accept and SilentDrop are indistinguishable.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Accept | Self::SilentDrop(_) => StatusCode::SEE_OTHER,
            Self::Reject(reason) => reason.status(),
        }
    }

    pub fn terminal_stage(&self) -> GateStage {
        match self {
            Self::Accept => GateStage::Persisted,
            Self::SilentDrop(_) => GateStage::SilentlyDropped,
            Self::Reject(_) => GateStage::Rejected,
        }
    }
}

/// Pipeline stages, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStage {
    Received,
    DomainCheck,
    HoneypotCheck,
    CaptchaCheck,
    BlockedSenderCheck,
    Persisted,
    SilentlyDropped,
    Rejected,
}

impl GateStage {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Persisted | Self::SilentlyDropped | Self::Rejected
        )
    }
}

impl fmt::Display for GateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::DomainCheck => "domain_check",
            Self::HoneypotCheck => "honeypot_check",
            Self::CaptchaCheck => "captcha_check",
            Self::BlockedSenderCheck => "blocked_sender_check",
            Self::Persisted => "persisted",
            Self::SilentlyDropped => "silently_dropped",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Everything the transport layer needs to answer the client.
#[derive(Debug)]
pub struct GateOutcome {
    pub decision: GateDecision,
    /// Redirect target for Accept and SilentDrop.
    pub redirect: Option<String>,
    /// The stored record, on Accept.
    pub record: Option<SubmissionRecord>,
    /// Running notification fan-out, on Accept.
    pub fanout: Option<JoinHandle<FanoutReport>>,
}

/// Orchestrates the checks, persistence and notification fan-out.
pub struct SubmissionGate {
    store: Arc<dyn SubmissionStore>,
    captcha: CaptchaVerifier,
    senders: BlockedSenderChecker,
    fanout: NotificationFanout,
    metrics: GateMetrics,
    public_base_url: Option<String>,
}

impl SubmissionGate {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        captcha: CaptchaVerifier,
        fanout: NotificationFanout,
        metrics: GateMetrics,
    ) -> Self {
        Self {
            store,
            captcha,
            senders: BlockedSenderChecker::default(),
            fanout,
            metrics,
            public_base_url: None,
        }
    }

    /// Prefix default acknowledgement paths with an absolute base URL.
    pub fn with_public_base_url(mut self, base: Option<String>) -> Self {
        self.public_base_url = base;
        self
    }

    /// Replace the sender field candidates.
    pub fn with_sender_checker(mut self, senders: BlockedSenderChecker) -> Self {
        self.senders = senders;
        self
    }

    pub fn store(&self) -> &Arc<dyn SubmissionStore> {
        &self.store
    }

    pub fn metrics(&self) -> &GateMetrics {
        &self.metrics
    }

    /// Where Accept and SilentDrop responses send the client.
    pub fn redirect_for(&self, form: &FormConfig) -> String {
        form.redirect_destination(self.public_base_url.as_deref())
    }

    /// Run the checks in order without side effects.
    ///
    /// Only a block-list read failure is an error.
    pub async fn evaluate(
        &self,
        form: &FormConfig,
        request: &SubmissionRequest,
    ) -> Result<GateDecision, StoreError> {
        debug!(form_id = %form.id, stage = %GateStage::DomainCheck, "Evaluating submission");
        if !referrer::allowed(&form.allowed_domains, request.referrer.as_deref()) {
            return Ok(GateDecision::Reject(RejectReason::DomainNotAllowed));
        }

        debug!(form_id = %form.id, stage = %GateStage::HoneypotCheck, "Evaluating submission");
        if honeypot::triggered(form.honeypot_field.as_deref(), &request.fields) {
            return Ok(GateDecision::SilentDrop(DropReason::Honeypot));
        }

        debug!(form_id = %form.id, stage = %GateStage::CaptchaCheck, "Evaluating submission");
        let verified = self
            .captcha
            .verify(
                form.captcha_secret.as_ref(),
                request.captcha_token.as_deref(),
                request.remote_ip.as_deref(),
            )
            .await;
        if !verified {
            return Ok(GateDecision::Reject(RejectReason::CaptchaFailed));
        }

        debug!(form_id = %form.id, stage = %GateStage::BlockedSenderCheck, "Evaluating submission");
        let block_list = StoredBlockList::new(self.store.as_ref(), &form.id);
        if self.senders.blocked(&block_list, &request.fields)? {
            return Ok(GateDecision::SilentDrop(DropReason::BlockedSender));
        }

        Ok(GateDecision::Accept)
    }

    /// Evaluate, then persist and notify if accepted.
    ///
    /// Persistence happens before notification. A persistence failure is
    /// returned; notification failures are logged by the fan-out and never
    /// affect the outcome.
    pub async fn submit(
        &self,
        form: &FormConfig,
        request: SubmissionRequest,
    ) -> Result<GateOutcome, StoreError> {
        let decision = match self.evaluate(form, &request).await {
            Ok(decision) => decision,
            Err(err) => {
                error!(form_id = %form.id, error = %err, "Failed to read block-list");
                self.metrics.record_store_error();
                return Err(err);
            }
        };

        let outcome = match decision {
            GateDecision::Reject(reason) => {
                info!(form_id = %form.id, reason = %reason, "Submission rejected");
                GateOutcome {
                    decision,
                    redirect: None,
                    record: None,
                    fanout: None,
                }
            }
            GateDecision::SilentDrop(reason) => {
                info!(form_id = %form.id, reason = %reason, "Submission silently dropped");
                GateOutcome {
                    decision,
                    redirect: Some(self.redirect_for(form)),
                    record: None,
                    fanout: None,
                }
            }
            GateDecision::Accept => {
                let record = SubmissionRecord::accept(form.id.clone(), request);
                if let Err(err) = self.store.create(record.clone()) {
                    error!(form_id = %form.id, error = %err, "Failed to persist submission");
                    self.metrics.record_store_error();
                    return Err(err);
                }
                info!(
                    form_id = %form.id,
                    submission_id = %record.id,
                    recipients = form.recipients.len(),
                    "Submission accepted"
                );

                let fanout = self.fanout.dispatch(form, &record, &form.recipients);
                GateOutcome {
                    decision,
                    redirect: Some(self.redirect_for(form)),
                    record: Some(record),
                    fanout: Some(fanout),
                }
            }
        };

        self.metrics.record_decision(&outcome.decision);
        Ok(outcome)
    }
}
