// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request-level errors and their HTTP mapping.

use crate::form::FormId;
use crate::gate::RejectReason;
use crate::store::StoreError;
use crate::submission::BodyError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// Anything that stops a submission from getting a redirect.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Form not found: {0}")]
    FormNotFound(FormId),

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] BodyError),

    #[error("Submission rejected: {0}")]
    Rejected(RejectReason),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::FormNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Rejected(reason) => reason.status(),
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::FormNotFound(_) => "FORM_NOT_FOUND",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::Rejected(_) => "FORBIDDEN",
            Self::Store(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message. Rejections and storage failures stay generic.
    fn public_message(&self) -> String {
        match self {
            Self::FormNotFound(_) => "Form not found".to_string(),
            Self::InvalidBody(err) => err.to_string(),
            Self::Rejected(_) => "Forbidden".to_string(),
            Self::Store(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        if let Self::Store(err) = &self {
            error!(error = %err, "Submission failed");
        }
        let status = self.status();
        let body = ErrorResponse {
            error: self.public_message(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}
