use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use super::{claims::Claims, cookie::SessionCookies, jwt::JwtKeys};
use crate::{
    error::{ApiError, AuthError},
    state::AppState,
};

/// Claims of the caller's session, read from the `token` cookie.
///
/// Rejects with a localized [`AuthError::Unauthorized`] when no cookie is
/// present and [`AuthError::InvalidToken`] when it does not verify.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let messages = state.catalog.resolve(&parts.headers);
        let jar = CookieJar::from_headers(&parts.headers);
        let token = SessionCookies::get(&jar)
            .ok_or_else(|| AuthError::Unauthorized.localize(&messages))?;

        let keys = JwtKeys::from_ref(state);
        match keys.verify(&token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                Err(AuthError::InvalidToken.localize(&messages))
            }
        }
    }
}
