use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{instrument, warn};

use crate::{
    auth::{
        cookie::SessionCookies,
        dto::{AuthResponse, LoginRequest, MeResponse, MessageResponse, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        services,
    },
    error::{ApiError, AuthError},
    i18n::{Localized, Messages},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

/// Unwraps a JSON body, turning every rejection into a 400.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>, messages: &Messages) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|e| {
        warn!(error = %e, "malformed request body");
        AuthError::Validation(e.body_text()).localize(messages)
    })
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Localized(messages): Localized,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let payload = json_body(payload, &messages)?;

    let user = services::register(state.users.as_ref(), payload)
        .await
        .map_err(|e| e.localize(&messages))?;

    let keys = JwtKeys::from_ref(&state);
    let token = services::issue_session(&keys, &user).map_err(|e| e.localize(&messages))?;
    let jar = SessionCookies::from_ref(&state).set(jar, token);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: messages.auth.registered.clone(),
            user: user.into(),
        }),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Localized(messages): Localized,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let payload = json_body(payload, &messages)?;

    let user = services::login(state.users.as_ref(), payload)
        .await
        .map_err(|e| e.localize(&messages))?;

    let keys = JwtKeys::from_ref(&state);
    let token = services::issue_session(&keys, &user).map_err(|e| e.localize(&messages))?;
    let jar = SessionCookies::from_ref(&state).set(jar, token);

    Ok((
        jar,
        Json(AuthResponse {
            message: messages.auth.logged_in.clone(),
            user: user.into(),
        }),
    ))
}

/// Always succeeds; a token copied before logout stays valid until it expires.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    Localized(messages): Localized,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = SessionCookies::from_ref(&state).clear(jar);
    (
        jar,
        Json(MessageResponse {
            message: messages.auth.logged_out.clone(),
        }),
    )
}

#[instrument(skip_all)]
pub async fn get_me(
    State(state): State<AppState>,
    Localized(messages): Localized,
    AuthUser(claims): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = services::current_user(state.users.as_ref(), &claims)
        .await
        .map_err(|e| e.localize(&messages))?;
    Ok(Json(MeResponse { user }))
}
