use anyhow::Context;
use axum::{
    extract::{rejection::FormRejection, DefaultBodyLimit, Multipart, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginForm, SignupForm, Upload},
        extractors::AuthSession,
        services,
        sessions::{clear_session_cookie, extract_session_token, session_cookie},
    },
    error::AppError,
    pages,
    state::AppState,
};

pub fn page_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route(
            "/signup",
            get(signup_page)
                .post(signup)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/login", get(login_page).post(login))
        .route("/profile", get(profile))
        .route("/logout", get(logout))
}

/// Form-level failures re-render the form with the message; the rest take
/// their usual response.
fn form_error(err: AppError, render: fn(Option<&str>) -> String) -> Response {
    match err {
        AppError::DuplicateUsername | AppError::InvalidCredentials | AppError::Validation(_) => {
            (err.status(), Html(render(Some(&err.user_message())))).into_response()
        }
        other => other.into_response(),
    }
}

pub async fn home() -> Html<String> {
    Html(pages::home())
}

pub async fn signup_page() -> Html<String> {
    Html(pages::signup_form(None))
}

pub async fn login_page() -> Html<String> {
    Html(pages::login_form(None))
}

async fn read_signup(mut mp: Multipart) -> Result<(SignupForm, Option<Upload>), AppError> {
    let mut form = SignupForm::default();
    let mut picture = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Could not read form: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "profile_picture" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let body = field
                .bytes()
                .await
                .map_err(|e| AppError::validation(format!("Could not read upload: {}", e.body_text())))?;
            // browsers send an empty part when no file was chosen
            if !(filename.is_empty() && body.is_empty()) {
                picture = Some(Upload { filename, body });
            }
            continue;
        }
        let text = field
            .text()
            .await
            .map_err(|e| AppError::validation(format!("Could not read form: {}", e.body_text())))?;
        match name.as_str() {
            "username" => form.username = text,
            "password" => form.password = text,
            "name" => form.name = text,
            "age" => form.age = text,
            "gender" => form.gender = text,
            "dob" => form.dob = text,
            _ => {}
        }
    }
    Ok((form, picture))
}

#[instrument(skip(state, mp))]
pub async fn signup(State(state): State<AppState>, mp: Multipart) -> Response {
    let result = async {
        let (form, picture) = read_signup(mp).await?;
        services::register_user(&state, form, picture).await
    }
    .await;

    match result {
        Ok(_) => Redirect::to("/login").into_response(),
        Err(e) => form_error(e, pages::signup_form),
    }
}

/// A session cookie the browser still presents is revoked once the new one
/// is issued.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let result = async {
        let Form(form) = form
            .map_err(|e| AppError::validation(format!("Could not read form: {}", e.body_text())))?;
        let token = services::login(&state, &form.username, &form.password).await?;
        if let Some(old) = extract_session_token(&headers) {
            services::logout(&state, &old).await?;
        }
        let cookie = session_cookie(&token, state.config.session_cookie_secure)
            .context("build session cookie")?;
        Ok::<_, AppError>(cookie)
    }
    .await;

    match result {
        Ok(cookie) => ([(SET_COOKIE, cookie)], Redirect::to("/profile")).into_response(),
        Err(e) => form_error(e, pages::login_form),
    }
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn profile(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Html<String>, AppError> {
    // user row gone: treat as logged out
    let user = state
        .users
        .find_by_id(session.user_id)
        .await?
        .ok_or(AppError::Unauthenticated)?;
    Ok(Html(pages::profile(&user)))
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Response, AppError> {
    services::logout(&state, &session.token).await?;
    let cookie = clear_session_cookie(state.config.session_cookie_secure)
        .context("build clearing cookie")?;
    info!(user_id = %session.user_id, "user logged out");
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/login")).into_response())
}
