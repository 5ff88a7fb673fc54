//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a handler can hit, from a malformed form to a lost database connection,
//! ends up as one of its variants.
//!
//! `AppError` implements `actix_web::error::ResponseError`. The authentication gate
//! (`Forbidden`) produces a bare 403 with no body; every other variant re-renders the
//! home page with the message in its error list and the matching status code.
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors` and
//! `bcrypt::BcryptError` allow the `?` operator in stores and handlers.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;
use validator::ValidationErrors;

use crate::views;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Credentials were presented but rejected (HTTP 401).
    Unauthorized(String),
    /// No user is bound to the request and the route requires one (HTTP 403).
    Forbidden,
    /// A requested resource was not found, or the actor may not touch it (HTTP 404).
    NotFound(String),
    /// An unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// An error originating from a store backend (HTTP 500).
    /// The message is logged but never shown to the user.
    DatabaseError(String),
    /// One or more submitted fields failed validation (HTTP 422).
    /// Each entry is a human-readable message.
    ValidationError(Vec<String>),
}

impl AppError {
    /// Shorthand for a validation failure with a single message.
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(vec![msg.into()])
    }

    /// The messages shown to the user on the re-rendered page.
    ///
    /// Infrastructure failures collapse into a generic message so that driver
    /// details never reach the browser.
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            AppError::Unauthorized(msg) | AppError::NotFound(msg) => vec![msg.clone()],
            AppError::ValidationError(msgs) => msgs.clone(),
            AppError::Forbidden => Vec::new(),
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                vec!["Something went wrong, please try again.".to_string()]
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msgs) => write!(f, "Validation Error: {}", msgs.join("; ")),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Forbidden => HttpResponse::Forbidden().finish(),
            // Without a request context the page renders as anonymous.
            _ => views::render_home(self.status_code(), None, None, &self.user_messages()),
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `NotFound`; everything else is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into one message per failing field.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {}", field),
                })
            })
            .collect();
        messages.sort();
        AppError::ValidationError(messages)
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
