//! Token route definitions

use axum::{routing::post, Router};

use crate::handlers::{obtain_token, refresh_token};
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/token", post(obtain_token))
        .route("/api/token/refresh", post(refresh_token))
}
