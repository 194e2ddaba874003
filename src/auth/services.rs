use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::dto::{LoginRequest, SignupRequest};
use super::guard::authenticate;
use super::password::hash_password_blocking;
use crate::error::AppError;
use crate::users::{repo as users_repo, repo_types::User};

pub const MAX_USERNAME_LEN: usize = 30;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref URL_RE: Regex = Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_url(url: &str) -> bool {
    URL_RE.is_match(url)
}

pub(crate) fn validate_username(raw: &str) -> Result<String, AppError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(AppError::validation("username", "username is required"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::validation(
            "username",
            format!("username must be at most {} characters", MAX_USERNAME_LEN),
        ));
    }
    Ok(username.to_string())
}

pub(crate) fn validate_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) || email.chars().count() > MAX_EMAIL_LEN {
        return Err(AppError::validation("email", "invalid email"));
    }
    Ok(email)
}

/// Empty or absent means "not supplied".
pub(crate) fn validate_optional_url(field: &'static str, raw: Option<&str>) -> Result<Option<String>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(url) if is_valid_url(url) => Ok(Some(url.to_string())),
        Some(_) => Err(AppError::validation(field, "invalid URL")),
    }
}

/// Create an account. Username and email uniqueness is decided by the store.
pub async fn signup(db: &SqlitePool, req: SignupRequest) -> Result<User, AppError> {
    let username = validate_username(&req.username)?;
    let email = validate_email(&req.email)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            "password",
            format!("password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    let image_url = validate_optional_url("image_url", req.image_url.as_deref())?;

    let hash = hash_password_blocking(req.password).await?;
    let user = users_repo::create_user(db, &username, &email, &hash, image_url.as_deref())
        .await
        .map_err(|e| {
            if let AppError::Conflict { field, .. } = &e {
                warn!(%username, field, "signup conflict");
            }
            e
        })?;
    info!(user_id = user.id, %username, "user signed up");
    Ok(user)
}

/// Generic failure on unknown user or bad password.
pub async fn login(db: &SqlitePool, req: LoginRequest) -> Result<User, AppError> {
    match authenticate(db, req.username.trim(), &req.password).await? {
        Some(user) => {
            info!(user_id = user.id, username = %user.username, "user logged in");
            Ok(user)
        }
        None => {
            warn!(username = %req.username, "invalid credentials");
            Err(AppError::Unauthorized("invalid credentials".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    fn signup_req(username: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            image_url: None,
        }
    }

    #[test]
    fn email_and_url_shapes() {
        assert!(is_valid_email("u@test.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@test.com"));
        assert!(is_valid_url("https://example.com/a.png"));
        assert!(!is_valid_url("example.com/a.png"));
        assert!(!is_valid_url("javascript:alert(1)"));
    }

    #[tokio::test]
    async fn signup_then_login() {
        let st = AppState::in_memory().await.unwrap();
        let user = signup(&st.db, signup_req("u", " U@Test.com ", "password")).await.unwrap();
        assert_eq!(user.email, "u@test.com");
        assert_ne!(user.password_hash, "password");

        let logged_in = login(
            &st.db,
            LoginRequest {
                username: "u".into(),
                password: "password".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(logged_in.id, user.id);

        let err = login(
            &st.db,
            LoginRequest {
                username: "u".into(),
                password: "wrong".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "invalid credentials"));
    }

    #[tokio::test]
    async fn signup_validates_fields() {
        let st = AppState::in_memory().await.unwrap();
        let cases = [
            (signup_req("", "u@test.com", "password"), "username"),
            (signup_req(&"x".repeat(31), "u@test.com", "password"), "username"),
            (signup_req("u", "nope", "password"), "email"),
            (signup_req("u", "u@test.com", "short"), "password"),
        ];
        for (req, expected) in cases {
            match signup(&st.db, req).await {
                Err(AppError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected validation error on {expected}, got {other:?}"),
            }
        }

        let mut bad_image = signup_req("u", "u@test.com", "password");
        bad_image.image_url = Some("not a url".into());
        assert!(matches!(
            signup(&st.db, bad_image).await,
            Err(AppError::Validation { field: "image_url", .. })
        ));
    }

    #[tokio::test]
    async fn signup_conflicts_are_field_specific() {
        let st = AppState::in_memory().await.unwrap();
        signup(&st.db, signup_req("u", "u@test.com", "password")).await.unwrap();
        assert!(matches!(
            signup(&st.db, signup_req("u", "other@test.com", "password")).await,
            Err(AppError::Conflict { field: "username", .. })
        ));
        assert!(matches!(
            signup(&st.db, signup_req("v", "u@test.com", "password")).await,
            Err(AppError::Conflict { field: "email", .. })
        ));
    }
}
