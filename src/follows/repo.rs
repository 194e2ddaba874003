use sqlx::{Executor, Sqlite};

use crate::db::is_check_violation;
use crate::error::AppError;
use crate::users::repo_types::User;

fn map_insert_error(err: sqlx::Error) -> AppError {
    if is_check_violation(&err) {
        return AppError::forbidden("cannot follow yourself");
    }
    let missing_user = err
        .as_database_error()
        .map(|e| e.is_foreign_key_violation())
        .unwrap_or(false);
    if missing_user {
        return AppError::NotFound("user");
    }
    AppError::Database(err)
}

/// Record that `follower_id` follows `followed_id`. Returns `false` when the
/// edge already existed.
pub async fn add_follow_edge<'e, E>(db: E, follower_id: i64, followed_id: i64) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(
        r#"
        INSERT INTO follows (followed_id, follower_id)
        VALUES (?1, ?2)
        ON CONFLICT (followed_id, follower_id) DO NOTHING
        "#,
    )
    .bind(followed_id)
    .bind(follower_id)
    .execute(db)
    .await
    .map_err(map_insert_error)?;
    Ok(res.rows_affected() == 1)
}

/// Returns `false` when there was nothing to remove.
pub async fn remove_follow_edge<'e, E>(db: E, follower_id: i64, followed_id: i64) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query("DELETE FROM follows WHERE followed_id = ?1 AND follower_id = ?2")
        .bind(followed_id)
        .bind(follower_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Does `a` follow `b`?
pub async fn is_following<'e, E>(db: E, a: i64, b: i64) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2)",
    )
    .bind(a)
    .bind(b)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

/// Is `a` followed by `b`?
pub async fn is_followed_by<'e, E>(db: E, a: i64, b: i64) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    is_following(db, b, a).await
}

/// Users that `user_id` follows.
pub async fn following_of<'e, E>(db: E, user_id: i64) -> Result<Vec<User>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.email, u.password_hash, u.image_url, u.header_image_url, u.bio, u.location
          FROM follows f
          JOIN users u ON u.id = f.followed_id
         WHERE f.follower_id = ?1
         ORDER BY u.username ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(users)
}

/// Users following `user_id`.
pub async fn followers_of<'e, E>(db: E, user_id: i64) -> Result<Vec<User>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.email, u.password_hash, u.image_url, u.header_image_url, u.bio, u.location
          FROM follows f
          JOIN users u ON u.id = f.follower_id
         WHERE f.followed_id = ?1
         ORDER BY u.username ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(users)
}
