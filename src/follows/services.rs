use sqlx::SqlitePool;
use tracing::{info, warn};

use super::repo;
use crate::auth::guard::require_authenticated;
use crate::error::AppError;
use crate::users::{repo as users_repo, repo_types::User};

/// Start following `target_id`. Following someone twice is a no-op.
pub async fn follow(db: &SqlitePool, actor: Option<&User>, target_id: i64) -> Result<(), AppError> {
    let actor = require_authenticated(actor)?;
    if actor.id == target_id {
        warn!(user_id = actor.id, "attempted self-follow");
        return Err(AppError::forbidden("cannot follow yourself"));
    }
    users_repo::get_user(db, target_id).await?;
    if repo::add_follow_edge(db, actor.id, target_id).await? {
        info!(follower_id = actor.id, followed_id = target_id, "user followed");
    }
    Ok(())
}

/// Stop following `target_id`. Not following is not an error.
pub async fn unfollow(db: &SqlitePool, actor: Option<&User>, target_id: i64) -> Result<(), AppError> {
    let actor = require_authenticated(actor)?;
    users_repo::get_user(db, target_id).await?;
    if repo::remove_follow_edge(db, actor.id, target_id).await? {
        info!(follower_id = actor.id, followed_id = target_id, "user unfollowed");
    }
    Ok(())
}

pub async fn is_following(db: &SqlitePool, a: i64, b: i64) -> Result<bool, AppError> {
    repo::is_following(db, a, b).await
}

pub async fn is_followed_by(db: &SqlitePool, a: i64, b: i64) -> Result<bool, AppError> {
    repo::is_followed_by(db, a, b).await
}

/// Users that `user_id` follows.
pub async fn following(db: &SqlitePool, user_id: i64) -> Result<Vec<User>, AppError> {
    users_repo::get_user(db, user_id).await?;
    repo::following_of(db, user_id).await
}

pub async fn followers(db: &SqlitePool, user_id: i64) -> Result<Vec<User>, AppError> {
    users_repo::get_user(db, user_id).await?;
    repo::followers_of(db, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::users::repo::create_user;

    #[tokio::test]
    async fn follow_is_idempotent() {
        let st = AppState::in_memory().await.unwrap();
        let a = create_user(&st.db, "a", "a@test.com", "h", None).await.unwrap();
        let b = create_user(&st.db, "b", "b@test.com", "h", None).await.unwrap();

        follow(&st.db, Some(&a), b.id).await.unwrap();
        follow(&st.db, Some(&a), b.id).await.unwrap();

        assert!(is_following(&st.db, a.id, b.id).await.unwrap());
        assert_eq!(followers(&st.db, b.id).await.unwrap().len(), 1);
        assert_eq!(following(&st.db, a.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn self_follow_is_forbidden() {
        let st = AppState::in_memory().await.unwrap();
        let a = create_user(&st.db, "a", "a@test.com", "h", None).await.unwrap();

        let err = follow(&st.db, Some(&a), a.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m == "cannot follow yourself"));
        assert!(following(&st.db, a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_target_or_actor() {
        let st = AppState::in_memory().await.unwrap();
        let a = create_user(&st.db, "a", "a@test.com", "h", None).await.unwrap();

        assert!(matches!(
            follow(&st.db, Some(&a), 999).await,
            Err(AppError::NotFound("user"))
        ));
        assert!(matches!(
            unfollow(&st.db, Some(&a), 999).await,
            Err(AppError::NotFound("user"))
        ));
        assert!(matches!(
            follow(&st.db, None, a.id).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            followers(&st.db, 999).await,
            Err(AppError::NotFound("user"))
        ));
    }

    #[tokio::test]
    async fn unfollow_without_edge_succeeds() {
        let st = AppState::in_memory().await.unwrap();
        let a = create_user(&st.db, "a", "a@test.com", "h", None).await.unwrap();
        let b = create_user(&st.db, "b", "b@test.com", "h", None).await.unwrap();

        unfollow(&st.db, Some(&a), b.id).await.unwrap();
        follow(&st.db, Some(&a), b.id).await.unwrap();
        unfollow(&st.db, Some(&a), b.id).await.unwrap();
        assert!(!is_following(&st.db, a.id, b.id).await.unwrap());
        assert!(!is_followed_by(&st.db, b.id, a.id).await.unwrap());
    }
}
