use axum::extract::FromRef;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{auth::jwt::SESSION_TTL, state::AppState};

/// Cookie name for the session token.
pub const SESSION_COOKIE: &str = "token";

/// Writes, reads and clears the session cookie.
///
/// The cookie is always `HttpOnly`; `Secure` follows the environment.
#[derive(Debug, Clone, Copy)]
pub struct SessionCookies {
    secure: bool,
}

impl FromRef<AppState> for SessionCookies {
    fn from_ref(state: &AppState) -> Self {
        SessionCookies::new(state.config.secure_cookies())
    }
}

impl SessionCookies {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    pub fn set(&self, jar: CookieJar, token: String) -> CookieJar {
        let cookie = Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(SESSION_TTL);
        jar.add(cookie)
    }

    /// Emits a removal cookie even when the request carried none.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        let mut cookie = Cookie::build((SESSION_COOKIE, ""))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .build();
        cookie.make_removal();
        jar.add(cookie)
    }

    pub fn get(jar: &CookieJar) -> Option<String> {
        jar.get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }
}
