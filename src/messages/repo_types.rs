use sqlx::FromRow;
use time::OffsetDateTime;

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_LEN: usize = 140;

/// Message record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub timestamp: OffsetDateTime, // assigned by the store
    pub user_id: i64,              // author
}

/// A message joined with its author and the viewer's like state. This is the
/// row shape of every feed and listing query.
#[derive(Debug, Clone, FromRow)]
pub struct MessageView {
    pub id: i64,
    pub text: String,
    pub timestamp: OffsetDateTime,
    pub user_id: i64,
    pub username: String,
    pub image_url: String,
    pub liked: bool,
}
