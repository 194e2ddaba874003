use sqlx::SqlitePool;
use tracing::info;

use super::repo;
use super::repo_types::MessageView;
use crate::auth::guard::{require_authenticated, require_ownership};
use crate::error::AppError;
use crate::users::repo_types::User;

/// Post a message as the actor.
pub async fn post_message(
    db: &SqlitePool,
    actor: Option<&User>,
    text: &str,
) -> Result<MessageView, AppError> {
    let actor = require_authenticated(actor)?;
    let msg = repo::create_message(db, text, actor.id).await?;
    info!(message_id = msg.id, user_id = actor.id, "message posted");
    repo::get_message_view(db, msg.id, Some(actor.id)).await
}

pub async fn show_message(
    db: &SqlitePool,
    message_id: i64,
    viewer: Option<&User>,
) -> Result<MessageView, AppError> {
    repo::get_message_view(db, message_id, viewer.map(|v| v.id)).await
}

/// Only the author may delete.
pub async fn delete_message(
    db: &SqlitePool,
    actor: Option<&User>,
    message_id: i64,
) -> Result<(), AppError> {
    let actor = require_authenticated(actor)?;
    let mut tx = db.begin().await?;
    if repo::delete_message_by_author(&mut *tx, message_id, actor.id).await? {
        tx.commit().await?;
        info!(message_id, user_id = actor.id, "message deleted");
        return Ok(());
    }
    // Nothing deleted: tell a missing message apart from someone else's.
    let msg = repo::get_message(&mut *tx, message_id).await?;
    require_ownership(Some(actor), msg.user_id)?;
    Err(AppError::NotFound("message"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::TempDb;
    use crate::state::AppState;
    use crate::users::repo::create_user;

    #[tokio::test]
    async fn anonymous_cannot_post() {
        let st = AppState::in_memory().await.unwrap();
        assert!(matches!(
            post_message(&st.db, None, "hello").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn post_returns_view_with_author() {
        let st = AppState::in_memory().await.unwrap();
        let u = create_user(&st.db, "u", "u@test.com", "h", None).await.unwrap();
        let view = post_message(&st.db, Some(&u), "hello").await.unwrap();
        assert_eq!(view.text, "hello");
        assert_eq!(view.username, "u");
        assert!(!view.liked);
    }

    #[tokio::test]
    async fn only_the_author_deletes() {
        let st = AppState::in_memory().await.unwrap();
        let author = create_user(&st.db, "a", "a@test.com", "h", None).await.unwrap();
        let other = create_user(&st.db, "o", "o@test.com", "h", None).await.unwrap();
        let msg = post_message(&st.db, Some(&author), "mine").await.unwrap();

        assert!(matches!(
            delete_message(&st.db, Some(&other), msg.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(repo::find_message(&st.db, msg.id).await.unwrap().is_some());

        assert!(matches!(
            delete_message(&st.db, None, msg.id).await,
            Err(AppError::Unauthorized(_))
        ));

        delete_message(&st.db, Some(&author), msg.id).await.unwrap();
        assert!(repo::find_message(&st.db, msg.id).await.unwrap().is_none());

        assert!(matches!(
            delete_message(&st.db, Some(&author), msg.id).await,
            Err(AppError::NotFound("message"))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deletes_remove_once() {
        let tmp = TempDb::new(10).await;
        let db = tmp.db.clone();
        let author = create_user(&db, "a", "a@test.com", "h", None).await.unwrap();
        let message_id = post_message(&db, Some(&author), "going away").await.unwrap().id;

        let tasks: Vec<_> = (0..6)
            .map(|_| {
                let db = db.clone();
                let author = author.clone();
                tokio::spawn(async move { delete_message(&db, Some(&author), message_id).await })
            })
            .collect();
        let mut deleted = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(()) => deleted += 1,
                Err(AppError::NotFound("message")) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(deleted, 1);
    }
}
