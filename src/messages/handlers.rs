use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{DeletedMessageResponse, MessageResponse, NewMessageRequest};
use super::services;
use crate::{auth::guard::CurrentUser, error::AppError, state::AppState};

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages/new", post(create_message))
        .route("/messages/:id", get(show_message))
        .route("/messages/:id/delete", post(delete_message))
}

#[instrument(skip(state, actor, payload))]
pub async fn create_message(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(payload): Json<NewMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let view = services::post_message(&state.db, actor.as_ref(), &payload.text).await?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

#[instrument(skip(state, actor))]
pub async fn show_message(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let view = services::show_message(&state.db, id, actor.as_ref()).await?;
    Ok(Json(view.into()))
}

#[instrument(skip(state, actor))]
pub async fn delete_message(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<DeletedMessageResponse>, AppError> {
    services::delete_message(&state.db, actor.as_ref(), id).await?;
    Ok(Json(DeletedMessageResponse { deleted: id }))
}
