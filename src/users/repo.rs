use sqlx::{Executor, Sqlite};

use crate::db::unique_violation_field;
use crate::error::AppError;
use crate::users::repo_types::{ProfileChanges, ProfileCounts, User, DEFAULT_IMAGE_URL};

fn map_write_error(err: sqlx::Error) -> AppError {
    match unique_violation_field(&err) {
        Some(field) => AppError::conflict(field),
        None => AppError::Database(err),
    }
}

/// Insert a new user. A taken username or email surfaces as `Conflict`.
pub async fn create_user<'e, E>(
    db: E,
    username: &str,
    email: &str,
    password_hash: &str,
    image_url: Option<&str>,
) -> Result<User, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash, image_url)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id, username, email, password_hash, image_url, header_image_url, bio, location
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(image_url.unwrap_or(DEFAULT_IMAGE_URL))
    .fetch_one(db)
    .await
    .map_err(map_write_error)
}

pub async fn find_user_by_id<'e, E>(db: E, id: i64) -> Result<Option<User>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, image_url, header_image_url, bio, location
        FROM users
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn get_user<'e, E>(db: E, id: i64) -> Result<User, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    find_user_by_id(db, id).await?.ok_or(AppError::NotFound("user"))
}

pub async fn find_user_by_username<'e, E>(db: E, username: &str) -> Result<Option<User>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, image_url, header_image_url, bio, location
        FROM users
        WHERE username = ?1
        "#,
    )
    .bind(username)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Users whose username contains `query` (ASCII case-insensitive). An empty
/// query lists everybody.
pub async fn search_users<'e, E>(db: E, query: &str) -> Result<Vec<User>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let pattern = format!("%{}%", escape_like(query));
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, image_url, header_image_url, bio, location
        FROM users
        WHERE username LIKE ?1 ESCAPE '\'
        ORDER BY username ASC
        "#,
    )
    .bind(pattern)
    .fetch_all(db)
    .await?;
    Ok(users)
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Apply `changes` only while `verified_hash` is still the stored password
/// hash. A hash that no longer matches is a failed re-authentication.
pub async fn update_profile<'e, E>(
    db: E,
    id: i64,
    verified_hash: &str,
    changes: &ProfileChanges,
) -> Result<User, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
           SET username = ?1,
               email = ?2,
               image_url = COALESCE(?3, image_url),
               header_image_url = COALESCE(?4, header_image_url),
               bio = ?5,
               location = ?6
         WHERE id = ?7
           AND password_hash = ?8
        RETURNING id, username, email, password_hash, image_url, header_image_url, bio, location
        "#,
    )
    .bind(&changes.username)
    .bind(&changes.email)
    .bind(changes.image_url.as_deref())
    .bind(changes.header_image_url.as_deref())
    .bind(changes.bio.as_deref())
    .bind(changes.location.as_deref())
    .bind(id)
    .bind(verified_hash)
    .fetch_optional(db)
    .await
    .map_err(map_write_error)?
    .ok_or_else(|| AppError::forbidden("wrong password"))
}

pub async fn profile_counts<'e, E>(db: E, id: i64) -> Result<ProfileCounts, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let counts = sqlx::query_as::<_, ProfileCounts>(
        r#"
        SELECT (SELECT COUNT(*) FROM messages WHERE user_id = ?1)    AS messages,
               (SELECT COUNT(*) FROM follows WHERE follower_id = ?1) AS following,
               (SELECT COUNT(*) FROM follows WHERE followed_id = ?1) AS followers,
               (SELECT COUNT(*) FROM likes WHERE user_id = ?1)       AS likes
        "#,
    )
    .bind(id)
    .fetch_one(db)
    .await?;
    Ok(counts)
}

/// Delete a user. Messages, follow edges in both directions and likes go with it.
pub async fn delete_user<'e, E>(db: E, id: i64) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("user"));
    }
    Ok(())
}
