// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission Gate
//!
//! Intake gatekeeper for a hosted form-submission endpoint. Every inbound
//! submission is run through an ordered set of checks before anything is
//! stored or anyone is notified:
//!
//! - Referrer domain allow-list (reject with 403)
//! - Honeypot field (silent drop)
//! - Captcha verification, fail-closed (reject with 403)
//! - Per-form blocked sender list (silent drop)
//!
//! Accepted submissions are persisted with their request metadata and then
//! fanned out to every configured recipient, each delivery isolated from
//! the others. Silent drops answer exactly like acceptances so automated
//! senders learn nothing.

pub mod blocklist;
pub mod captcha;
pub mod config;
pub mod error;
pub mod form;
pub mod gate;
pub mod handlers;
pub mod honeypot;
pub mod metrics;
pub mod notify;
pub mod referrer;
pub mod store;
pub mod submission;

pub use config::Config;
pub use error::GateError;
pub use form::{FormConfig, FormId, FormRegistry};
pub use gate::{DropReason, GateDecision, GateOutcome, RejectReason, SubmissionGate};
pub use notify::{LogNotifier, NotificationFanout, Notifier};
pub use store::{MemoryStore, SubmissionStore};
pub use submission::{SubmissionRecord, SubmissionRequest};
