// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Notification fan-out for accepted submissions.
//!
//! Each recipient is delivered in its own task. A failing or slow recipient
//! never blocks, retries into, or cancels another.

use crate::form::{FormConfig, FormId};
use crate::submission::SubmissionRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// Delivery failure for one recipient.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Notification transport unavailable: {0}")]
    Transport(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// One message for one recipient.
#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient: String,
    pub form_id: FormId,
    pub form_name: String,
    pub submission: SubmissionRecord,
}

impl Notification {
    pub fn subject(&self) -> &'static str {
        "New Form Submission Received"
    }

    /// Plain-text body listing every submitted field and the request metadata.
    pub fn body(&self) -> String {
        let mut lines = vec![
            format!(
                "A new submission has been received for the form: {}",
                self.form_name
            ),
            "Submission Data:".to_string(),
        ];
        for (key, value) in &self.submission.fields {
            lines.push(format!("{key}: {}", display_value(value)));
        }
        let or_blank = |v: &Option<String>| v.clone().unwrap_or_default();
        lines.push(format!("IP Address: {}", or_blank(&self.submission.ip)));
        lines.push(format!("User Agent: {}", or_blank(&self.submission.user_agent)));
        lines.push(format!("Referrer: {}", or_blank(&self.submission.referrer)));
        lines.join("\n")
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Outbound delivery hook (mail, webhook, chat adapter).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier that writes the rendered message to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        if !notification.recipient.contains('@') {
            return Err(NotifyError::InvalidRecipient(notification.recipient.clone()));
        }
        info!(
            recipient = %notification.recipient,
            form_id = %notification.form_id,
            submission_id = %notification.submission.id,
            subject = notification.subject(),
            "Submission notification delivered"
        );
        Ok(())
    }
}

/// Result of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, NotifyError)>,
}

impl FanoutReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Dispatches one notification per recipient concurrently.
#[derive(Clone)]
pub struct NotificationFanout {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl NotificationFanout {
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    /// Start delivery to every recipient and return immediately.
    ///
    /// The handle resolves once all deliveries have finished; callers on the
    /// request path drop it.
    pub fn dispatch(
        &self,
        form: &FormConfig,
        submission: &SubmissionRecord,
        recipients: &[String],
    ) -> JoinHandle<FanoutReport> {
        let mut tasks = JoinSet::new();
        let mut recipient_of = HashMap::with_capacity(recipients.len());

        for recipient in recipients {
            let notifier = Arc::clone(&self.notifier);
            let timeout = self.timeout;
            let notification = Notification {
                recipient: recipient.clone(),
                form_id: form.id.clone(),
                form_name: form.display_name().to_string(),
                submission: submission.clone(),
            };

            let handle = tasks.spawn(async move {
                match tokio::time::timeout(timeout, notifier.deliver(&notification)).await {
                    Ok(result) => result,
                    Err(_) => Err(NotifyError::Timeout(timeout)),
                }
            });
            recipient_of.insert(handle.id(), recipient.clone());
        }

        let submission_id = submission.id;
        tokio::spawn(async move {
            let mut report = FanoutReport::default();
            while let Some(joined) = tasks.join_next_with_id().await {
                let id = match &joined {
                    Ok((id, _)) => *id,
                    Err(join_err) => join_err.id(),
                };
                let recipient = recipient_of.remove(&id).unwrap_or_default();
                match joined {
                    Ok((_, Ok(()))) => {
                        debug!(%submission_id, recipient = %recipient, "Notification sent");
                        report.delivered.push(recipient);
                    }
                    Ok((_, Err(err))) => {
                        warn!(
                            %submission_id,
                            recipient = %recipient,
                            error = %err,
                            "Notification failed"
                        );
                        report.failed.push((recipient, err));
                    }
                    Err(join_err) => {
                        warn!(
                            %submission_id,
                            recipient = %recipient,
                            error = %join_err,
                            "Notification task aborted"
                        );
                        report
                            .failed
                            .push((recipient, NotifyError::Transport(join_err.to_string())));
                    }
                }
            }
            report
        })
    }
}
