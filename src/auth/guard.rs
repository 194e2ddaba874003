use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::password::{verify_dummy_blocking, verify_password_blocking};
use super::session::{session_tokens, SessionKeys};
use crate::error::AppError;
use crate::state::AppState;
use crate::users::{repo as users_repo, repo_types::User};

/// The actor of the current request, `None` when anonymous.
pub struct CurrentUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let actor = actor_from_headers(state, &parts.headers).await?;
        Ok(CurrentUser(actor))
    }
}

/// The first carried token that resolves wins, so a stale bearer token does
/// not hide a valid session cookie.
pub async fn actor_from_headers(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, AppError> {
    for token in session_tokens(headers) {
        if let Some(actor) = resolve_actor(state, Some(&token)).await? {
            return Ok(Some(actor));
        }
    }
    Ok(None)
}

/// Look up the user named by a session token. Missing, invalid or expired
/// tokens and tokens for deleted users all resolve to `None`.
pub async fn resolve_actor(state: &AppState, token: Option<&str>) -> Result<Option<User>, AppError> {
    let Some(token) = token else {
        return Ok(None);
    };
    let keys = SessionKeys::from_ref(state);
    let claims = match keys.verify(token) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "ignoring invalid session token");
            return Ok(None);
        }
    };
    let user = users_repo::find_user_by_id(&state.db, claims.sub).await?;
    if user.is_none() {
        warn!(user_id = claims.sub, "session for a user that no longer exists");
    }
    Ok(user)
}

pub fn require_authenticated(actor: Option<&User>) -> Result<&User, AppError> {
    actor.ok_or_else(AppError::unauthorized)
}

/// The actor must be signed in and be `owner_id`.
pub fn require_ownership(actor: Option<&User>, owner_id: i64) -> Result<&User, AppError> {
    let actor = require_authenticated(actor)?;
    if actor.id != owner_id {
        warn!(actor_id = actor.id, owner_id, "ownership check failed");
        return Err(AppError::forbidden("access unauthorized"));
    }
    Ok(actor)
}

/// Step-up confirmation for an already signed-in actor.
pub async fn require_reauth(actor: &User, password: &str) -> Result<(), AppError> {
    let ok = verify_password_blocking(password.to_string(), actor.password_hash.clone()).await?;
    if !ok {
        warn!(user_id = actor.id, "re-authentication failed");
        return Err(AppError::forbidden("wrong password"));
    }
    Ok(())
}

/// `None` for an unknown username and for a wrong password alike.
pub async fn authenticate(db: &SqlitePool, username: &str, password: &str) -> Result<Option<User>, AppError> {
    let Some(user) = users_repo::find_user_by_username(db, username).await? else {
        verify_dummy_blocking(password.to_string()).await?;
        return Ok(None);
    };
    let ok = verify_password_blocking(password.to_string(), user.password_hash.clone()).await?;
    Ok(ok.then_some(user))
}
