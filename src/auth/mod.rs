use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod sessions;
mod validation;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    handlers::page_routes(max_upload_bytes)
}
