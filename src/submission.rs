// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Inbound submissions and the records persisted for accepted ones.
//!
//! Submissions are schema-agnostic: whatever keys the client posts are kept
//! verbatim, in the order they arrived.

use crate::form::FormId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Ordered submitted fields. Values are strings, or arrays for repeated keys.
pub type Fields = serde_json::Map<String, Value>;

/// Body could not be turned into fields.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON body must be an object")]
    NotAnObject,
}

/// Ephemeral input to the gate, assembled from one HTTP request.
#[derive(Debug, Clone, Default)]
pub struct SubmissionRequest {
    pub fields: Fields,
    pub referrer: Option<String>,
    pub remote_ip: Option<String>,
    pub user_agent: Option<String>,
    pub captcha_token: Option<String>,
}

impl SubmissionRequest {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_remote_ip(mut self, ip: impl Into<String>) -> Self {
        self.remote_ip = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_captcha_token(mut self, token: impl Into<String>) -> Self {
        self.captcha_token = Some(token.into());
        self
    }
}

/// Read a scalar field as text. Arrays, objects and nulls yield `None`.
pub fn field_text<'a>(fields: &'a Fields, name: &str) -> Option<std::borrow::Cow<'a, str>> {
    fields.get(name).and_then(value_text)
}

/// Text of a scalar value; `None` for null, arrays and objects.
pub fn value_text(value: &Value) -> Option<std::borrow::Cow<'_, str>> {
    match value {
        Value::String(s) => Some(std::borrow::Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(std::borrow::Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(std::borrow::Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// Parse an `application/x-www-form-urlencoded` body.
///
/// `key[]` entries and repeated keys collect into arrays.
pub fn parse_form_body(body: &[u8]) -> Fields {
    let mut fields = Fields::new();

    for (key, value) in url::form_urlencoded::parse(body) {
        let (name, is_list) = match key.strip_suffix("[]") {
            Some(base) => (base.to_string(), true),
            None => (key.into_owned(), false),
        };
        let value = Value::String(value.into_owned());

        match fields.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None if is_list => {
                fields.insert(name, Value::Array(vec![value]));
            }
            None => {
                fields.insert(name, value);
            }
        }
    }

    fields
}

/// Parse a JSON object body.
pub fn parse_json_body(body: &[u8]) -> Result<Fields, BodyError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(BodyError::NotAnObject),
    }
}

/// Identifier of a persisted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An accepted submission.
///
/// Immutable once created except for `seen_at`, which moves from `None` to a
/// timestamp once and never back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub form_id: FormId,
    pub fields: Fields,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub seen_at: Option<DateTime<Utc>>,
}

impl SubmissionRecord {
    /// Build a fresh, unseen record from an accepted request.
    pub fn accept(form_id: FormId, request: SubmissionRequest) -> Self {
        Self {
            id: SubmissionId::new(),
            form_id,
            fields: request.fields,
            ip: request.remote_ip,
            user_agent: request.user_agent,
            referrer: request.referrer,
            created_at: Utc::now(),
            seen_at: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.seen_at.is_none()
    }

    pub fn is_seen(&self) -> bool {
        self.seen_at.is_some()
    }

    /// Set `seen_at` if unset. Returns whether the record changed.
    pub fn mark_seen(&mut self, at: DateTime<Utc>) -> bool {
        if self.seen_at.is_some() {
            return false;
        }
        self.seen_at = Some(at);
        true
    }
}
