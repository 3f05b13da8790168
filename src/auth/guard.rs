//! Route guard for the profile pages.
//!
//! Every request passes through [`route_guard`]. Paths outside the protected
//! area are forwarded untouched. Protected paths are forwarded only when the
//! session cookie holds a token that verifies; otherwise the caller is sent
//! to the login page of their locale. The guard never issues or refreshes
//! tokens.

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use super::{cookie::SessionCookies, jwt::JwtKeys};
use crate::{i18n::Catalog, state::AppState};

const PROTECTED_SEGMENT: &str = "profile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allowed,
    Denied { redirect_to: String },
}

#[derive(Debug, PartialEq, Eq)]
enum Area<'a> {
    Public,
    Protected { locale: Option<&'a str> },
}

/// `/profile/..` and `/{locale}/profile/..` are protected.
fn classify<'a>(path: &'a str, catalog: &Catalog) -> Area<'a> {
    let mut segments = path.trim_start_matches('/').split('/');
    let first = segments.next().unwrap_or("");
    if first == PROTECTED_SEGMENT {
        return Area::Protected { locale: None };
    }
    if catalog.contains(first) && segments.next() == Some(PROTECTED_SEGMENT) {
        return Area::Protected {
            locale: Some(first),
        };
    }
    Area::Public
}

pub fn evaluate(
    path: &str,
    token: Option<&str>,
    keys: &JwtKeys,
    catalog: &Catalog,
) -> GuardDecision {
    let locale = match classify(path, catalog) {
        Area::Public => return GuardDecision::Allowed,
        Area::Protected { locale } => locale.unwrap_or(catalog.default_locale()),
    };

    let verified = match token {
        Some(token) => match keys.verify(token) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, %path, "guard rejected token");
                false
            }
        },
        None => false,
    };

    if verified {
        GuardDecision::Allowed
    } else {
        GuardDecision::Denied {
            redirect_to: format!("/{locale}/login"),
        }
    }
}

pub async fn route_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let token = SessionCookies::get(&jar);
    let keys = JwtKeys::from_ref(&state);
    match evaluate(req.uri().path(), token.as_deref(), &keys, &state.catalog) {
        GuardDecision::Allowed => next.run(req).await,
        GuardDecision::Denied { redirect_to } => {
            debug!(path = %req.uri().path(), %redirect_to, "guard denied");
            Redirect::temporary(&redirect_to).into_response()
        }
    }
}
