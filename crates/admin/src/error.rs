//! Unified error handling for admin.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;

/// Message shown on fatal pages. Deliberately generic: the page is shown for
/// both malformed and unknown identifiers.
pub const FATAL_MESSAGE: &str = "Something went wrong.";

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Terminal user-facing failure rendered as a full error page (HTTP 400).
    ///
    /// The payload is logged but never shown to the user.
    #[error("Fatal: {0}")]
    Fatal(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Full-page error template.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Fatal(_) => StatusCode::BAD_REQUEST,
        };

        if let Self::Fatal(reason) = &self {
            tracing::warn!(reason = %reason, "Fatal admin page");
            let page = ErrorTemplate {
                title: "Error".to_string(),
                message: FATAL_MESSAGE.to_string(),
            };
            let body = page.render().unwrap_or_else(|e| {
                tracing::error!("Template render error: {}", e);
                FATAL_MESSAGE.to_string()
            });
            return (status, Html(body)).into_response();
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}
