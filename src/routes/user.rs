//! User route definitions

use axum::{routing::get, Router};

use crate::handlers::{create_user, delete_user, get_user, list_users, update_user};
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
}
