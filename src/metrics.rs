// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for gate decisions and notification outcomes.

use crate::gate::GateDecision;
use crate::notify::FanoutReport;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Gate metrics registry.
#[derive(Clone)]
pub struct GateMetrics {
    registry: Registry,
    decisions: IntCounterVec,
    notifications: IntCounterVec,
}

impl GateMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let decisions = IntCounterVec::new(
            Opts::new(
                "submission_gate_decisions_total",
                "Submissions by gate outcome and reason",
            ),
            &["outcome", "reason"],
        )?;
        let notifications = IntCounterVec::new(
            Opts::new(
                "submission_gate_notifications_total",
                "Notification deliveries by result",
            ),
            &["result"],
        )?;

        registry.register(Box::new(decisions.clone()))?;
        registry.register(Box::new(notifications.clone()))?;

        Ok(Self {
            registry,
            decisions,
            notifications,
        })
    }

    pub fn record_decision(&self, decision: &GateDecision) {
        self.decisions
            .with_label_values(&[decision.outcome_label(), decision.reason_label()])
            .inc();
    }

    /// A submission that ended in a persistence error.
    pub fn record_store_error(&self) {
        self.decisions.with_label_values(&["error", "store"]).inc();
    }

    pub fn record_fanout(&self, report: &FanoutReport) {
        self.notifications
            .with_label_values(&["delivered"])
            .inc_by(report.delivered.len() as u64);
        self.notifications
            .with_label_values(&["failed"])
            .inc_by(report.failed.len() as u64);
    }

    pub fn decision_count(&self, outcome: &str, reason: &str) -> u64 {
        self.decisions.with_label_values(&[outcome, reason]).get()
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
