use axum::{
    extract::{FromRef, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, SignupRequest},
        services,
        session::SessionKeys,
    },
    error::AppError,
    state::AppState,
    users::repo_types::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", get(logout))
}

/// Sign a session for `user` and hand it back both as a cookie and in the body.
fn establish_session(
    keys: &SessionKeys,
    status: StatusCode,
    user: User,
) -> Result<impl IntoResponse, AppError> {
    let token = keys.sign(user.id)?;
    let cookie = keys.session_cookie(&token);
    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = services::signup(&state.db, payload).await?;
    establish_session(&SessionKeys::from_ref(&state), StatusCode::CREATED, user)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = services::login(&state.db, payload).await?;
    establish_session(&SessionKeys::from_ref(&state), StatusCode::OK, user)
}

#[instrument(skip(keys))]
pub async fn logout(State(keys): State<SessionKeys>) -> impl IntoResponse {
    info!("session cleared");
    (
        [(header::SET_COOKIE, keys.clear_cookie())],
        Json(json!({ "message": "logged out" })),
    )
}
