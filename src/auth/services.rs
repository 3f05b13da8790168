use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    claims::{Claims, SessionIdentity},
    dto::{LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_dummy_blocking, verify_password_blocking},
    repo::UserStore,
    repo_types::{NewUser, User, UserProfile},
};
use crate::error::AuthError;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 64;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(payload: &mut RegisterRequest) -> Result<(), AuthError> {
    payload.username = payload.username.trim().to_string();
    payload.email = normalize_email(&payload.email);

    let username_len = payload.username.chars().count();
    if username_len == 0 || username_len > MAX_USERNAME_LEN {
        return Err(AuthError::Validation("username length".into()));
    }
    if !is_valid_email(&payload.email) {
        return Err(AuthError::Validation("email format".into()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation("password too short".into()));
    }
    Ok(())
}

pub async fn register(store: &dyn UserStore, mut payload: RegisterRequest) -> Result<User, AuthError> {
    validate_registration(&mut payload)?;

    // Checked up front; the store re-checks atomically on insert.
    if store.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AuthError::DuplicateEmail);
    }

    let password_hash = hash_password_blocking(payload.password).await?;
    let user = store
        .create(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Both an unknown email and a wrong password yield
/// [`AuthError::InvalidCredentials`].
pub async fn login(store: &dyn UserStore, payload: LoginRequest) -> Result<User, AuthError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        verify_dummy_blocking(payload.password).await;
        warn!("login with empty credentials");
        return Err(AuthError::InvalidCredentials);
    }

    let Some(user) = store.find_by_email(&email).await? else {
        verify_dummy_blocking(payload.password).await;
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    let ok = verify_password_blocking(payload.password, user.password_hash.clone()).await?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(user)
}

pub fn issue_session(keys: &JwtKeys, user: &User) -> Result<String, AuthError> {
    let identity = SessionIdentity {
        id: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
    };
    Ok(keys.sign(&identity)?)
}

pub async fn current_user(store: &dyn UserStore, claims: &Claims) -> Result<UserProfile, AuthError> {
    match store.find_by_id(claims.id).await? {
        Some(profile) => Ok(profile),
        None => {
            warn!(user_id = %claims.id, "session user no longer exists");
            Err(AuthError::NotFound)
        }
    }
}
