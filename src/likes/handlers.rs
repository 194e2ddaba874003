use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::services::{self, LikeOutcome};
use crate::{
    auth::guard::CurrentUser, error::AppError, messages::dto::MessageResponse, state::AppState,
};

pub fn like_routes() -> Router<AppState> {
    Router::new()
        .route("/messages/:id/like", post(toggle_like))
        .route("/users/:id/likes", get(liked_messages))
}

#[instrument(skip(state, actor))]
pub async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeOutcome>, AppError> {
    let outcome = services::toggle_like(&state.db, actor.as_ref(), id).await?;
    Ok(Json(outcome))
}

#[instrument(skip(state, actor))]
pub async fn liked_messages(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let messages = services::liked_messages_of(&state.db, id, actor.as_ref()).await?;
    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}
