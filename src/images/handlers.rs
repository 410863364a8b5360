use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::instrument;

use super::services::load_profile_picture;
use crate::{error::AppError, state::AppState};

pub fn uploads_routes() -> Router<AppState> {
    Router::new().route("/uploads/:key", get(get_upload))
}

#[instrument(skip(state))]
pub async fn get_upload(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let obj = load_profile_picture(&state, &key).await?;
    Ok(([(header::CONTENT_TYPE, obj.content_type)], obj.body))
}
