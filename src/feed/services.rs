use sqlx::SqlitePool;

use crate::error::AppError;
use crate::follows::repo as follows_repo;
use crate::messages::{repo as messages_repo, repo_types::MessageView};
use crate::users::{
    repo as users_repo,
    repo_types::{ProfileCounts, User},
};

/// Most recent entries returned by any feed.
pub const FEED_LIMIT: i64 = 100;

#[derive(Debug)]
pub enum HomeView {
    Landing,
    Feed { messages: Vec<MessageView> },
}

/// A user's page as seen by `viewer`.
#[derive(Debug)]
pub struct Profile {
    pub user: User,
    pub counts: ProfileCounts,
    pub is_following: Option<bool>,
    pub is_followed_by: Option<bool>,
    pub messages: Vec<MessageView>,
}

/// Anonymous callers get the landing view. Everyone else gets their own
/// messages plus those of the people they follow.
pub async fn home_feed(db: &SqlitePool, actor: Option<&User>) -> Result<HomeView, AppError> {
    let Some(actor) = actor else {
        return Ok(HomeView::Landing);
    };
    let messages = messages_repo::timeline_for(db, actor.id, FEED_LIMIT).await?;
    Ok(HomeView::Feed { messages })
}

pub async fn profile_feed(
    db: &SqlitePool,
    user_id: i64,
    viewer: Option<&User>,
) -> Result<Vec<MessageView>, AppError> {
    users_repo::get_user(db, user_id).await?;
    messages_repo::messages_by_user(db, user_id, viewer.map(|v| v.id), FEED_LIMIT).await
}

pub async fn profile(db: &SqlitePool, user_id: i64, viewer: Option<&User>) -> Result<Profile, AppError> {
    let user = users_repo::get_user(db, user_id).await?;
    let counts = users_repo::profile_counts(db, user_id).await?;
    let messages = profile_feed(db, user_id, viewer).await?;

    let (is_following, is_followed_by) = match viewer {
        Some(v) => (
            Some(follows_repo::is_following(db, v.id, user_id).await?),
            Some(follows_repo::is_followed_by(db, v.id, user_id).await?),
        ),
        None => (None, None),
    };

    Ok(Profile {
        user,
        counts,
        is_following,
        is_followed_by,
        messages,
    })
}
