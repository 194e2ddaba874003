use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{EditProfileRequest, ProfileResponse, SearchQuery, UserDetail, UserSummary};
use super::services;
use crate::{
    auth::guard::CurrentUser, error::AppError, feed::services as feed, messages::dto::MessageResponse,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(search_users))
        .route("/users/profile", post(edit_profile))
        .route("/users/:id", get(show_user))
}

#[instrument(skip(state))]
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = services::search(&state.db, params.q.as_deref()).await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

#[instrument(skip(state, actor))]
pub async fn show_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = feed::profile(&state.db, id, actor.as_ref()).await?;
    Ok(Json(ProfileResponse {
        user: profile.user.into(),
        counts: profile.counts,
        is_following: profile.is_following,
        is_followed_by: profile.is_followed_by,
        messages: profile.messages.into_iter().map(MessageResponse::from).collect(),
    }))
}

#[instrument(skip(state, actor, payload))]
pub async fn edit_profile(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(payload): Json<EditProfileRequest>,
) -> Result<Json<UserDetail>, AppError> {
    let user = services::edit_profile(&state.db, actor.as_ref(), payload).await?;
    Ok(Json(user.into()))
}
