use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;

use super::services;
use crate::{
    auth::guard::CurrentUser, error::AppError, state::AppState, users::dto::UserSummary,
};

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub user_id: i64,
    pub following: bool,
}

pub fn follow_routes() -> Router<AppState> {
    Router::new()
        .route("/users/follow/:id", post(follow))
        .route("/users/stop-following/:id", post(stop_following))
        .route("/users/:id/following", get(following))
        .route("/users/:id/followers", get(followers))
}

#[instrument(skip(state, actor))]
pub async fn follow(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<FollowResponse>, AppError> {
    services::follow(&state.db, actor.as_ref(), id).await?;
    Ok(Json(FollowResponse {
        user_id: id,
        following: true,
    }))
}

#[instrument(skip(state, actor))]
pub async fn stop_following(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<FollowResponse>, AppError> {
    services::unfollow(&state.db, actor.as_ref(), id).await?;
    Ok(Json(FollowResponse {
        user_id: id,
        following: false,
    }))
}

#[instrument(skip(state))]
pub async fn following(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = services::following(&state.db, id).await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

#[instrument(skip(state))]
pub async fn followers(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = services::followers(&state.db, id).await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}
