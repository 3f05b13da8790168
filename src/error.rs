use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::i18n::Messages;

/// Failures raised by a [`crate::auth::repo::UserStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already in use")]
    DuplicateEmail,
    #[error("username already in use")]
    DuplicateUsername,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Outcome taxonomy of the auth endpoints.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("email already in use")]
    DuplicateEmail,
    #[error("username already in use")]
    DuplicateUsername,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("missing session")]
    Unauthorized,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("user not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::DuplicateUsername => AuthError::DuplicateUsername,
            StoreError::Database(e) => AuthError::Internal(e.into()),
            StoreError::Other(e) => AuthError::Internal(e),
        }
    }
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::DuplicateEmail | AuthError::DuplicateUsername => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::Unauthorized | AuthError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Turns the error into the client-facing response. Internal detail is
    /// logged here and never copied into the body.
    pub fn localize(self, messages: &Messages) -> ApiError {
        let message = match &self {
            AuthError::Validation(_) => &messages.auth.invalid_request,
            AuthError::DuplicateEmail => &messages.auth.email_in_use,
            AuthError::DuplicateUsername => &messages.auth.username_in_use,
            AuthError::InvalidCredentials => &messages.auth.invalid_credentials,
            AuthError::Unauthorized => &messages.auth.unauthorized,
            AuthError::InvalidToken => &messages.auth.invalid_token,
            AuthError::NotFound => &messages.auth.user_not_found,
            AuthError::Internal(e) => {
                error!(error = ?e, "internal error");
                &messages.auth.internal_error
            }
        };
        ApiError {
            status: self.status(),
            message: message.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error response: a status plus a `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(AuthError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(AuthError::DuplicateUsername.status(), StatusCode::CONFLICT);
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let catalog = Catalog::load().expect("bundles");
        let messages = catalog.get("en").expect("en bundle");
        let api = AuthError::Internal(anyhow::anyhow!("pool timed out: 10.0.0.5")).localize(&messages);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message.contains("10.0.0.5"));
        assert_eq!(api.message, messages.auth.internal_error);
    }

    #[test]
    fn validation_message_does_not_name_the_field() {
        let catalog = Catalog::load().expect("bundles");
        let messages = catalog.get("en").expect("en bundle");
        let api = AuthError::Validation("password too short".into()).localize(&messages);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(!api.message.contains("password"));
    }

    #[test]
    fn store_duplicates_map_to_conflicts() {
        assert!(matches!(
            AuthError::from(StoreError::DuplicateEmail),
            AuthError::DuplicateEmail
        ));
        assert!(matches!(
            AuthError::from(StoreError::DuplicateUsername),
            AuthError::DuplicateUsername
        ));
        assert!(matches!(
            AuthError::from(StoreError::Database(sqlx::Error::PoolClosed)),
            AuthError::Internal(_)
        ));
    }
}
