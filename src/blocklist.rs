// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Blocked sender detection.
//!
//! Submissions have no enforced schema, so the sender address is looked up
//! under a fixed list of common field names. Addresses posted under any
//! other name are not checked.

use crate::form::{normalize_email, FormId};
use crate::store::{StoreError, SubmissionStore};
use crate::submission::{value_text, Fields};
use serde_json::Value;
use tracing::debug;

/// Field names inspected for a sender address, in order.
pub const EMAIL_FIELD_CANDIDATES: &[&str] = &[
    "email",
    "user_email",
    "contact_email",
    "from",
    "sender",
    "reply_to",
];

/// Read access to one form's block-list.
pub trait BlockList {
    fn count(&self) -> Result<usize, StoreError>;
    /// `email` is already trimmed and lowercased.
    fn contains(&self, email: &str) -> Result<bool, StoreError>;
}

/// A form's block-list as held in a [`SubmissionStore`].
pub struct StoredBlockList<'a> {
    store: &'a dyn SubmissionStore,
    form_id: &'a FormId,
}

impl<'a> StoredBlockList<'a> {
    pub fn new(store: &'a dyn SubmissionStore, form_id: &'a FormId) -> Self {
        Self { store, form_id }
    }
}

impl BlockList for StoredBlockList<'_> {
    fn count(&self) -> Result<usize, StoreError> {
        self.store.count_blocked(self.form_id)
    }

    fn contains(&self, email: &str) -> Result<bool, StoreError> {
        self.store.exists_blocked(self.form_id, email)
    }
}

/// Checks candidate sender fields against a block-list.
#[derive(Debug, Clone)]
pub struct BlockedSenderChecker {
    candidates: Vec<String>,
}

impl Default for BlockedSenderChecker {
    fn default() -> Self {
        Self::with_candidates(EMAIL_FIELD_CANDIDATES.iter().copied())
    }
}

impl BlockedSenderChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different ordered list of field names.
    pub fn with_candidates<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// True if any candidate field holds a blocked address.
    ///
    /// Array values (repeated keys, `key[]`) are checked element by element.
    /// An empty block-list returns false without looking at `fields`.
    pub fn blocked(&self, list: &dyn BlockList, fields: &Fields) -> Result<bool, StoreError> {
        if list.count()? == 0 {
            return Ok(false);
        }

        for name in &self.candidates {
            let Some(value) = fields.get(name.as_str()) else {
                continue;
            };
            for email in sender_addresses(value) {
                if list.contains(&email)? {
                    debug!(field = %name, "Sender is on the block-list");
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

/// Normalized, non-empty addresses held by one field value.
fn sender_addresses(value: &Value) -> Vec<String> {
    let scalars: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    scalars
        .into_iter()
        .filter_map(value_text)
        .map(|text| normalize_email(&text))
        .filter(|email| !email.is_empty())
        .collect()
}
