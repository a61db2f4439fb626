//! Book route definitions

use axum::{routing::get, Router};

use crate::handlers::{create_book, delete_book, get_book, list_books, update_book};
use crate::state::AppState;

pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/api/books", get(list_books).post(create_book))
        .route(
            "/api/books/:id",
            get(get_book)
                .put(update_book)
                .patch(update_book)
                .delete(delete_book),
        )
}
