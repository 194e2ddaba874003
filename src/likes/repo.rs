use sqlx::{Executor, Sqlite};

use crate::error::AppError;
use crate::messages::repo_types::MessageView;

/// Returns `false` when the like already existed.
pub async fn insert_like<'e, E>(db: E, user_id: i64, message_id: i64) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(
        r#"
        INSERT INTO likes (user_id, message_id)
        VALUES (?1, ?2)
        ON CONFLICT (user_id, message_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(message_id)
    .execute(db)
    .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn delete_like<'e, E>(db: E, user_id: i64, message_id: i64) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query("DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2")
        .bind(user_id)
        .bind(message_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Every message `user_id` has liked, newest first. `liked` is relative to
/// `viewer_id`.
pub async fn liked_messages_of<'e, E>(
    db: E,
    user_id: i64,
    viewer_id: Option<i64>,
) -> Result<Vec<MessageView>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, MessageView>(
        r#"
        SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url,
               EXISTS(SELECT 1 FROM likes v WHERE v.message_id = m.id AND v.user_id = ?2) AS liked
          FROM likes l
          JOIN messages m ON m.id = l.message_id
          JOIN users u ON u.id = m.user_id
         WHERE l.user_id = ?1
         ORDER BY m.timestamp DESC, m.id DESC
        "#,
    )
    .bind(user_id)
    .bind(viewer_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
