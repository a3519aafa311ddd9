// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP-facing errors and their HTML responses.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use bildwerk_core::BildwerkError;

use crate::pages;

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The request body could not be read as a multipart form.
    #[error("Invalid request: {0}")]
    BadRequest(String),
    /// The body exceeded the configured request size limit.
    #[error("Request body too large")]
    PayloadTooLarge,
    /// Anything that went wrong while processing or storing files.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebError::BadRequest(detail) => {
                tracing::warn!(detail, "Rejected malformed request");
                (
                    StatusCode::BAD_REQUEST,
                    "The upload could not be read. Please try again.",
                )
            }
            WebError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "The upload is larger than the server accepts. Send fewer or smaller images.",
            ),
            WebError::Internal(detail) => {
                tracing::error!(detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong while processing your images.",
                )
            }
        };
        (status, Html(pages::error_page(status, message))).into_response()
    }
}

impl From<MultipartError> for WebError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            WebError::PayloadTooLarge
        } else {
            WebError::BadRequest(err.body_text())
        }
    }
}

impl From<BildwerkError> for WebError {
    fn from(err: BildwerkError) -> Self {
        WebError::Internal(err.to_string())
    }
}
