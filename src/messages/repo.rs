use sqlx::{Executor, Sqlite};
use time::OffsetDateTime;

use crate::db::{format_timestamp, is_check_violation};
use crate::error::AppError;
use crate::messages::repo_types::{Message, MessageView, MAX_MESSAGE_LEN};

/// Storage-boundary check on message text.
pub fn validate_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::validation("text", "text is required"));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::validation(
            "text",
            format!("text must be at most {} characters", MAX_MESSAGE_LEN),
        ));
    }
    Ok(())
}

fn map_write_error(err: sqlx::Error) -> AppError {
    if is_check_violation(&err) {
        return AppError::validation(
            "text",
            format!("text must be at most {} characters", MAX_MESSAGE_LEN),
        );
    }
    let missing_author = err
        .as_database_error()
        .map(|e| e.is_foreign_key_violation())
        .unwrap_or(false);
    if missing_author {
        return AppError::NotFound("user");
    }
    AppError::Database(err)
}

/// Insert a message stamped with the store's current time.
pub async fn create_message<'e, E>(db: E, text: &str, user_id: i64) -> Result<Message, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    validate_text(text)?;
    sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (text, user_id)
        VALUES (?1, ?2)
        RETURNING id, text, timestamp, user_id
        "#,
    )
    .bind(text)
    .bind(user_id)
    .fetch_one(db)
    .await
    .map_err(map_write_error)
}

/// Insert a message with an explicit timestamp (imports, fixtures).
pub async fn create_message_at<'e, E>(
    db: E,
    text: &str,
    user_id: i64,
    timestamp: OffsetDateTime,
) -> Result<Message, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    validate_text(text)?;
    let ts = format_timestamp(timestamp)?;
    sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (text, user_id, timestamp)
        VALUES (?1, ?2, ?3)
        RETURNING id, text, timestamp, user_id
        "#,
    )
    .bind(text)
    .bind(user_id)
    .bind(ts)
    .fetch_one(db)
    .await
    .map_err(map_write_error)
}

pub async fn find_message<'e, E>(db: E, id: i64) -> Result<Option<Message>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let msg = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, text, timestamp, user_id
        FROM messages
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(msg)
}

pub async fn get_message<'e, E>(db: E, id: i64) -> Result<Message, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    find_message(db, id).await?.ok_or(AppError::NotFound("message"))
}

pub async fn get_message_view<'e, E>(
    db: E,
    id: i64,
    viewer_id: Option<i64>,
) -> Result<MessageView, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, MessageView>(
        r#"
        SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url,
               EXISTS(SELECT 1 FROM likes l WHERE l.message_id = m.id AND l.user_id = ?2) AS liked
          FROM messages m
          JOIN users u ON u.id = m.user_id
         WHERE m.id = ?1
        "#,
    )
    .bind(id)
    .bind(viewer_id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound("message"))
}

pub async fn delete_message<'e, E>(db: E, id: i64) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query("DELETE FROM messages WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("message"));
    }
    Ok(())
}

/// Delete `id` only if `author_id` wrote it. Returns `false` when nothing
/// matched.
pub async fn delete_message_by_author<'e, E>(db: E, id: i64, author_id: i64) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query("DELETE FROM messages WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(author_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Messages written by `user_id`, newest first.
pub async fn messages_by_user<'e, E>(
    db: E,
    user_id: i64,
    viewer_id: Option<i64>,
    limit: i64,
) -> Result<Vec<MessageView>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, MessageView>(
        r#"
        SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url,
               EXISTS(SELECT 1 FROM likes l WHERE l.message_id = m.id AND l.user_id = ?2) AS liked
          FROM messages m
          JOIN users u ON u.id = m.user_id
         WHERE m.user_id = ?1
         ORDER BY m.timestamp DESC, m.id DESC
         LIMIT ?3
        "#,
    )
    .bind(user_id)
    .bind(viewer_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Messages by `user_id` and by everyone `user_id` follows, newest first.
pub async fn timeline_for<'e, E>(db: E, user_id: i64, limit: i64) -> Result<Vec<MessageView>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, MessageView>(
        r#"
        SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url,
               EXISTS(SELECT 1 FROM likes l WHERE l.message_id = m.id AND l.user_id = ?1) AS liked
          FROM messages m
          JOIN users u ON u.id = m.user_id
         WHERE m.user_id = ?1
            OR m.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
         ORDER BY m.timestamp DESC, m.id DESC
         LIMIT ?2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::users::repo::create_user;
    use time::macros::datetime;

    async fn setup() -> (AppState, i64) {
        let st = AppState::in_memory().await.unwrap();
        let u = create_user(&st.db, "u", "u@test.com", "h", None).await.unwrap();
        (st, u.id)
    }

    #[tokio::test]
    async fn accepts_exactly_140_characters() {
        let (st, uid) = setup().await;
        let m = create_message(&st.db, &"a".repeat(140), uid).await.unwrap();
        assert_eq!(m.user_id, uid);
        assert_eq!(m.text.len(), 140);
    }

    #[tokio::test]
    async fn rejects_141_characters() {
        let (st, uid) = setup().await;
        let err = create_message(&st.db, &"a".repeat(141), uid).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "text", .. }));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&st.db)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn length_counts_characters_not_bytes() {
        let (st, uid) = setup().await;
        create_message(&st.db, &"é".repeat(140), uid).await.unwrap();
        assert!(create_message(&st.db, &"é".repeat(141), uid).await.is_err());
    }

    #[tokio::test]
    async fn table_constraint_backs_the_limit() {
        let (st, uid) = setup().await;
        let err = sqlx::query("INSERT INTO messages (text, user_id) VALUES (?1, ?2)")
            .bind("a".repeat(141))
            .bind(uid)
            .execute(&st.db)
            .await
            .unwrap_err();
        assert!(is_check_violation(&err));
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let (st, uid) = setup().await;
        assert!(matches!(
            create_message(&st.db, "   ", uid).await,
            Err(AppError::Validation { field: "text", .. })
        ));
    }

    #[tokio::test]
    async fn unknown_author_is_not_found() {
        let (st, _) = setup().await;
        assert!(matches!(
            create_message(&st.db, "hi", 999).await,
            Err(AppError::NotFound("user"))
        ));
    }

    #[tokio::test]
    async fn explicit_timestamps_round_trip() {
        let (st, uid) = setup().await;
        let ts = datetime!(2023-06-01 12:30:00.250 UTC);
        let m = create_message_at(&st.db, "then", uid, ts).await.unwrap();
        assert_eq!(m.timestamp, ts);
        let fetched = get_message(&st.db, m.id).await.unwrap();
        assert_eq!(fetched.timestamp, ts);
    }

    #[tokio::test]
    async fn listing_orders_by_timestamp_then_id() {
        let (st, uid) = setup().await;
        let same = datetime!(2024-01-01 00:00 UTC);
        let a = create_message_at(&st.db, "a", uid, same).await.unwrap();
        let b = create_message_at(&st.db, "b", uid, same).await.unwrap();
        let older = create_message_at(&st.db, "older", uid, datetime!(2023-01-01 00:00 UTC))
            .await
            .unwrap();
        let newest = create_message_at(&st.db, "newest", uid, datetime!(2025-01-01 00:00 UTC))
            .await
            .unwrap();

        let ids: Vec<i64> = messages_by_user(&st.db, uid, None, 100)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![newest.id, b.id, a.id, older.id]);
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let (st, uid) = setup().await;
        let m = create_message(&st.db, "bye", uid).await.unwrap();
        delete_message(&st.db, m.id).await.unwrap();
        assert!(find_message(&st.db, m.id).await.unwrap().is_none());
        assert!(matches!(
            delete_message(&st.db, m.id).await,
            Err(AppError::NotFound("message"))
        ));
    }
}
