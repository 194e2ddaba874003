use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::messages::repo_types::MessageView;
use crate::users::dto::UserSummary;

#[derive(Debug, Deserialize)]
pub struct NewMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub author: UserSummary,
    /// Whether the viewing user likes this message.
    pub liked: bool,
}

impl From<MessageView> for MessageResponse {
    fn from(m: MessageView) -> Self {
        Self {
            id: m.id,
            text: m.text,
            timestamp: m.timestamp,
            author: UserSummary {
                id: m.user_id,
                username: m.username,
                image_url: m.image_url,
            },
            liked: m.liked,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedMessageResponse {
    pub deleted: i64,
}
