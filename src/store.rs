// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission persistence and per-form block-lists.

use crate::form::{normalize_email, FormId};
use crate::submission::{SubmissionId, SubmissionRecord};
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

/// Persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Submission already exists: {0}")]
    Conflict(SubmissionId),

    #[error("Submission not found: {0}")]
    NotFound(SubmissionId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Filter for submission listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeenFilter {
    #[default]
    All,
    /// `seen_at` unset
    New,
    /// `seen_at` set
    Seen,
}

impl SeenFilter {
    pub fn matches(self, record: &SubmissionRecord) -> bool {
        match self {
            SeenFilter::All => true,
            SeenFilter::New => record.is_new(),
            SeenFilter::Seen => record.is_seen(),
        }
    }
}

/// Storage abstraction so the gate can be exercised in isolation.
pub trait SubmissionStore: Send + Sync {
    fn create(&self, record: SubmissionRecord) -> Result<SubmissionId, StoreError>;
    fn get(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, StoreError>;
    /// Records for one form, oldest first.
    fn list(
        &self,
        form_id: &FormId,
        filter: SeenFilter,
    ) -> Result<Vec<SubmissionRecord>, StoreError>;
    /// Set `seen_at` once; later calls keep the first timestamp.
    fn mark_seen(&self, id: &SubmissionId) -> Result<SubmissionRecord, StoreError>;

    /// Add an address to a form's block-list. Returns false if already present.
    fn block_email(&self, form_id: &FormId, email: &str) -> Result<bool, StoreError>;
    fn exists_blocked(&self, form_id: &FormId, normalized_email: &str)
        -> Result<bool, StoreError>;
    fn count_blocked(&self, form_id: &FormId) -> Result<usize, StoreError>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    submissions: RwLock<Vec<SubmissionRecord>>,
    blocked: RwLock<HashMap<FormId, BTreeSet<String>>>,
}

fn poisoned<E>(_: E) -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored submissions across forms.
    pub fn len(&self) -> usize {
        self.submissions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SubmissionStore for MemoryStore {
    fn create(&self, record: SubmissionRecord) -> Result<SubmissionId, StoreError> {
        let mut submissions = self.submissions.write().map_err(poisoned)?;
        if submissions.iter().any(|r| r.id == record.id) {
            return Err(StoreError::Conflict(record.id));
        }
        let id = record.id;
        debug!(submission_id = %id, form_id = %record.form_id, "Stored submission");
        submissions.push(record);
        Ok(id)
    }

    fn get(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, StoreError> {
        let submissions = self.submissions.read().map_err(poisoned)?;
        Ok(submissions.iter().find(|r| &r.id == id).cloned())
    }

    fn list(
        &self,
        form_id: &FormId,
        filter: SeenFilter,
    ) -> Result<Vec<SubmissionRecord>, StoreError> {
        let submissions = self.submissions.read().map_err(poisoned)?;
        Ok(submissions
            .iter()
            .filter(|r| &r.form_id == form_id && filter.matches(r))
            .cloned()
            .collect())
    }

    fn mark_seen(&self, id: &SubmissionId) -> Result<SubmissionRecord, StoreError> {
        let mut submissions = self.submissions.write().map_err(poisoned)?;
        let record = submissions
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or(StoreError::NotFound(*id))?;
        if record.mark_seen(Utc::now()) {
            debug!(submission_id = %id, "Submission marked as seen");
        }
        Ok(record.clone())
    }

    fn block_email(&self, form_id: &FormId, email: &str) -> Result<bool, StoreError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(false);
        }
        let mut blocked = self.blocked.write().map_err(poisoned)?;
        Ok(blocked.entry(form_id.clone()).or_default().insert(email))
    }

    fn exists_blocked(
        &self,
        form_id: &FormId,
        normalized_email: &str,
    ) -> Result<bool, StoreError> {
        let blocked = self.blocked.read().map_err(poisoned)?;
        Ok(blocked
            .get(form_id)
            .is_some_and(|emails| emails.contains(normalized_email)))
    }

    fn count_blocked(&self, form_id: &FormId) -> Result<usize, StoreError> {
        let blocked = self.blocked.read().map_err(poisoned)?;
        Ok(blocked.get(form_id).map_or(0, BTreeSet::len))
    }
}
