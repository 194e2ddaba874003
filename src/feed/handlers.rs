use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::HomeResponse;
use super::services;
use crate::{auth::guard::CurrentUser, error::AppError, state::AppState};

pub fn feed_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/home", get(home))
}

#[instrument(skip(state, actor))]
pub async fn home(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<HomeResponse>, AppError> {
    let view = services::home_feed(&state.db, actor.as_ref()).await?;
    Ok(Json(view.into()))
}
