use sqlx::SqlitePool;
use tracing::info;

use super::dto::EditProfileRequest;
use super::repo;
use super::repo_types::{ProfileChanges, User};
use crate::auth::guard::{require_authenticated, require_reauth};
use crate::auth::services::{validate_email, validate_optional_url, validate_username};
use crate::error::AppError;

pub const MAX_BIO_LEN: usize = 280;
pub const MAX_LOCATION_LEN: usize = 50;

/// Trimmed text, `None` when blank. Over-long input is a validation error.
fn optional_text(field: &'static str, raw: Option<&str>, max: usize) -> Result<Option<String>, AppError> {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > max {
        return Err(AppError::validation(
            field,
            format!("{} must be at most {} characters", field, max),
        ));
    }
    Ok(Some(text.to_string()))
}

fn validate_changes(req: &EditProfileRequest) -> Result<ProfileChanges, AppError> {
    Ok(ProfileChanges {
        username: validate_username(&req.username)?,
        email: validate_email(&req.email)?,
        image_url: validate_optional_url("image_url", req.image_url.as_deref())?,
        header_image_url: validate_optional_url("header_image_url", req.header_image_url.as_deref())?,
        bio: optional_text("bio", req.bio.as_deref(), MAX_BIO_LEN)?,
        location: optional_text("location", req.location.as_deref(), MAX_LOCATION_LEN)?,
    })
}

/// Update the actor's own profile after confirming their password.
pub async fn edit_profile(
    db: &SqlitePool,
    actor: Option<&User>,
    req: EditProfileRequest,
) -> Result<User, AppError> {
    let actor = require_authenticated(actor)?;
    let changes = validate_changes(&req)?;

    // Argon2 runs before any write. The single-statement update only lands
    // while the hash checked here is still the stored one.
    let current = repo::get_user(db, actor.id).await?;
    require_reauth(&current, &req.password).await?;
    let updated = repo::update_profile(db, current.id, &current.password_hash, &changes).await?;

    info!(user_id = updated.id, "profile updated");
    Ok(updated)
}

pub async fn search(db: &SqlitePool, query: Option<&str>) -> Result<Vec<User>, AppError> {
    repo::search_users(db, query.map(str::trim).unwrap_or("")).await
}
