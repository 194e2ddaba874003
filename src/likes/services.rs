use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::repo;
use crate::auth::guard::require_authenticated;
use crate::error::AppError;
use crate::messages::{repo as messages_repo, repo_types::MessageView};
use crate::users::{repo as users_repo, repo_types::User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub message_id: i64,
}

/// Like the message if the actor hasn't, unlike it if they have. Authors
/// cannot like their own messages.
pub async fn toggle_like(
    db: &SqlitePool,
    actor: Option<&User>,
    message_id: i64,
) -> Result<LikeOutcome, AppError> {
    let actor = require_authenticated(actor)?;

    let mut tx = db.begin().await?;
    // Write before reading: the transaction holds the write lock from its
    // first statement. Early returns roll the delete back.
    let unliked = repo::delete_like(&mut *tx, actor.id, message_id).await?;
    let msg = messages_repo::get_message(&mut *tx, message_id).await?;
    if msg.user_id == actor.id {
        warn!(user_id = actor.id, message_id, "attempted to like own message");
        return Err(AppError::forbidden("cannot like own message"));
    }
    if !unliked {
        repo::insert_like(&mut *tx, actor.id, message_id).await?;
    }
    tx.commit().await?;
    let liked = !unliked;

    info!(user_id = actor.id, message_id, liked, "like toggled");
    Ok(LikeOutcome { liked, message_id })
}

pub async fn liked_messages_of(
    db: &SqlitePool,
    user_id: i64,
    viewer: Option<&User>,
) -> Result<Vec<MessageView>, AppError> {
    users_repo::get_user(db, user_id).await?;
    repo::liked_messages_of(db, user_id, viewer.map(|v| v.id)).await
}
