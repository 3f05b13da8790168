use crate::state::AppState;
use axum::Router;

mod claims;
pub mod cookie;
pub mod dto;
pub(crate) mod extractors;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use claims::{Claims, SessionIdentity};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
