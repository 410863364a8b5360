use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::{services::require_session, sessions::extract_session_token};
use crate::{error::AppError, state::AppState};

/// Resolves the session cookie to a user. Rejects with
/// [`AppError::Unauthenticated`], which redirects to the login page.
pub struct AuthSession {
    pub user_id: Uuid,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(&parts.headers).ok_or(AppError::Unauthenticated)?;
        let user_id = require_session(state, &token).await?;
        Ok(AuthSession { user_id, token })
    }
}
