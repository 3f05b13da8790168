//! Page routes that sit behind the route guard.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile))
        .route("/:locale/profile", get(localized_profile))
}

async fn profile(State(state): State<AppState>) -> Html<String> {
    render_profile(&state, None)
}

/// Unknown locale segments are not pages; the guard only covers known ones.
async fn localized_profile(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<Html<String>, StatusCode> {
    if !state.catalog.contains(&locale) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(render_profile(&state, Some(&locale)))
}

fn render_profile(state: &AppState, locale: Option<&str>) -> Html<String> {
    let messages = locale
        .and_then(|code| state.catalog.get(code).ok())
        .unwrap_or_else(|| state.catalog.default_messages());
    Html(format!("<h1>{}</h1>", messages.profile.title))
}
