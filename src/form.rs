// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Form definitions and the immutable per-form snapshot handed to the gate.
//!
//! Definitions are read from a JSON file whose string fields follow the
//! settings UI: comma-separated allowed domains, recipients separated by
//! newlines, `;` or `,`.

use crate::store::{StoreError, SubmissionStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use url::Url;

/// Opaque, unguessable form identifier used in submission URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(pub String);

impl FormId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FormId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FormId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Captcha secret. Never printed, never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct CaptchaSecret(String);

impl CaptchaSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Raw value, for the verification request body only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CaptchaSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CaptchaSecret([redacted])")
    }
}

impl fmt::Display for CaptchaSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

/// Errors raised while loading form definitions.
#[derive(Debug, Error)]
pub enum FormConfigError {
    #[error("Failed to read forms file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse forms file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Form id must not be empty")]
    EmptyId,

    #[error("Duplicate form id: {0}")]
    DuplicateId(FormId),

    #[error("Invalid redirect URL for form {form}: {url}")]
    InvalidRedirect { form: FormId, url: String },

    #[error("Failed to seed block-list: {0}")]
    Store(#[from] StoreError),
}

/// On-disk shape of one form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormDefinition {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Comma-separated domains, e.g. `"example.com, mysite.org"`
    #[serde(default)]
    pub allowed_domains: Option<String>,

    #[serde(default)]
    pub honeypot_field: Option<String>,

    #[serde(default)]
    pub captcha_secret: Option<String>,

    #[serde(default)]
    pub redirect_url: Option<String>,

    /// Recipients separated by newlines, `;` or `,`
    #[serde(default)]
    pub forward_to: Option<String>,

    #[serde(default)]
    pub blocked_emails: Vec<String>,
}

/// Validated, normalized per-form configuration.
///
/// Every optional check is disabled when its setting is absent.
#[derive(Debug, Clone)]
pub struct FormConfig {
    pub id: FormId,
    pub name: Option<String>,
    pub allowed_domains: Vec<String>,
    pub honeypot_field: Option<String>,
    pub captcha_secret: Option<CaptchaSecret>,
    pub custom_redirect: Option<Url>,
    pub recipients: Vec<String>,
    /// Seed for the stored block-list, normalized lowercase.
    pub blocked_emails: BTreeSet<String>,
}

impl FormConfig {
    /// A form with every check disabled.
    pub fn new(id: impl Into<FormId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            allowed_domains: Vec::new(),
            honeypot_field: None,
            captcha_secret: None,
            custom_redirect: None,
            recipients: Vec::new(),
            blocked_emails: BTreeSet::new(),
        }
    }

    pub fn from_definition(def: FormDefinition) -> Result<Self, FormConfigError> {
        let id = def.id.trim();
        if id.is_empty() {
            return Err(FormConfigError::EmptyId);
        }
        let id = FormId::from(id);

        let custom_redirect = match non_empty(def.redirect_url) {
            Some(raw) => Some(Url::parse(&raw).map_err(|_| FormConfigError::InvalidRedirect {
                form: id.clone(),
                url: raw.clone(),
            })?),
            None => None,
        };

        Ok(Self {
            name: non_empty(def.name),
            allowed_domains: def
                .allowed_domains
                .as_deref()
                .map(parse_allowed_domains)
                .unwrap_or_default(),
            honeypot_field: non_empty(def.honeypot_field),
            captcha_secret: non_empty(def.captcha_secret).map(CaptchaSecret::new),
            custom_redirect,
            recipients: def
                .forward_to
                .as_deref()
                .map(parse_recipients)
                .unwrap_or_default(),
            blocked_emails: def
                .blocked_emails
                .iter()
                .map(|email| normalize_email(email))
                .filter(|email| !email.is_empty())
                .collect(),
            id,
        })
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }

    /// Default acknowledgement location for this form.
    pub fn acknowledgement_path(&self) -> String {
        format!("/f/{}/thank-you", self.id)
    }

    /// Where both accepted and silently dropped submissions are sent.
    pub fn redirect_destination(&self, public_base_url: Option<&str>) -> String {
        match &self.custom_redirect {
            Some(url) => url.to_string(),
            None => format!(
                "{}{}",
                public_base_url.unwrap_or_default(),
                self.acknowledgement_path()
            ),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a comma-separated domain list, dropping blanks.
pub fn parse_allowed_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

/// Split a recipient list on newlines, `;` and `,`, dropping blanks.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(|c: char| matches!(c, '\n' | '\r' | ';' | ','))
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim and lowercase an email address for block-list comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Immutable id → form map, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct FormRegistry {
    forms: HashMap<FormId, Arc<FormConfig>>,
}

impl FormRegistry {
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = FormDefinition>,
    ) -> Result<Self, FormConfigError> {
        let mut forms = HashMap::new();
        for def in definitions {
            let form = FormConfig::from_definition(def)?;
            if forms.contains_key(&form.id) {
                return Err(FormConfigError::DuplicateId(form.id));
            }
            forms.insert(form.id.clone(), Arc::new(form));
        }
        Ok(Self { forms })
    }

    pub fn from_forms(forms: impl IntoIterator<Item = FormConfig>) -> Self {
        Self {
            forms: forms
                .into_iter()
                .map(|form| (form.id.clone(), Arc::new(form)))
                .collect(),
        }
    }

    /// Load definitions from a JSON array file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|source| FormConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let definitions: Vec<FormDefinition> = serde_json::from_slice(&raw)?;
        let registry = Self::from_definitions(definitions)?;
        info!(forms = registry.len(), path = %path.display(), "Loaded form definitions");
        Ok(registry)
    }

    pub fn get(&self, id: &FormId) -> Option<Arc<FormConfig>> {
        self.forms.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Copy each form's configured block-list into the store.
    pub fn seed_block_lists(&self, store: &dyn SubmissionStore) -> Result<usize, FormConfigError> {
        let mut added = 0;
        for form in self.forms.values() {
            for email in &form.blocked_emails {
                if store.block_email(&form.id, email)? {
                    added += 1;
                }
            }
        }
        Ok(added)
    }
}
