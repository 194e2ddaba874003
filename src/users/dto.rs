use serde::{Deserialize, Serialize};

use crate::messages::dto::MessageResponse;
use crate::users::repo_types::{ProfileCounts, User};

/// Author card shown next to messages and in user lists.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub image_url: String,
}

impl From<User> for UserSummary {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            image_url: u.image_url,
        }
    }
}

/// Public profile fields. Email stays private.
#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub id: i64,
    pub username: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl From<User> for UserDetail {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            image_url: u.image_url,
            header_image_url: u.header_image_url,
            bio: u.bio,
            location: u.location,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserDetail,
    pub counts: ProfileCounts,
    /// Relation flags are omitted for anonymous viewers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_followed_by: Option<bool>,
    pub messages: Vec<MessageResponse>,
}

#[derive(Debug, Deserialize)]
pub struct EditProfileRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub header_image_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Current password, required to confirm the change.
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}
