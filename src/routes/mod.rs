//! Route definitions for the library API

mod auth;
mod book;
mod loan;
mod user;

use axum::{routing::get, Router};

use crate::error::ApiError;
use crate::handlers::{health_check, root};
use crate::middleware::{request_tracing, security_headers, SecurityHeaders};
use crate::state::AppState;

pub use auth::auth_routes;
pub use book::book_routes;
pub use loan::loan_routes;
pub use user::user_routes;

/// The full application router with tracing and security headers.
///
/// Rate limiting and CORS depend on deployment settings and are layered on
/// by the binary.
pub fn build_router(state: AppState, security: SecurityHeaders) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(auth_routes())
        .merge(user_routes())
        .merge(book_routes())
        .merge(loan_routes())
        .fallback(not_found)
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(security, security_headers))
        .layer(axum::middleware::from_fn(request_tracing))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found.".to_string())
}
