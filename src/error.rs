use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::error;

use crate::pages;

/// Failures a request can end with. None of them is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("This username already exists. Please choose a different one.")]
    DuplicateUsername,
    #[error("Login failed. Please check your username and password.")]
    InvalidCredentials,
    #[error("Please log in to access this page.")]
    Unauthenticated,
    #[error("{0}")]
    Validation(String),
    #[error("Not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateUsername => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Unauthenticated => StatusCode::SEE_OTHER,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show to the user. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Internal(_) => "Something went wrong. Please try again later.".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthenticated => Redirect::to("/login").into_response(),
            AppError::Internal(ref e) => {
                error!(error = ?e, "internal error");
                (self.status(), Html(pages::message_page(&self.user_message()))).into_response()
            }
            other => (other.status(), Html(pages::message_page(&other.user_message())))
                .into_response(),
        }
    }
}
