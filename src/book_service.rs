//! Book catalog service

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::{Book, BookFilter, CreateBookRequest, Page, PageRequest, UpdateBookRequest};
use crate::store::LibraryStore;

#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn LibraryStore>,
}

impl BookService {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }

    pub async fn create_book(&self, request: CreateBookRequest) -> ApiResult<Book> {
        request.validate()?;
        let book = self.store.insert_book(request.into_new_book()).await?;
        tracing::info!(book_id = %book.id, isbn = %book.isbn, "Book created");
        Ok(book)
    }

    pub async fn get_book(&self, id: Uuid) -> ApiResult<Book> {
        self.store
            .find_book(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))
    }

    pub async fn list_books(&self, filter: BookFilter, page: PageRequest) -> ApiResult<Page<Book>> {
        Ok(self.store.list_books(filter, page).await?)
    }

    /// Partial update of catalog fields
    pub async fn update_book(&self, id: Uuid, request: UpdateBookRequest) -> ApiResult<Book> {
        request.validate()?;
        let book = self.store.update_book(id, request.into_changes()).await?;
        tracing::debug!(book_id = %book.id, "Book updated");
        Ok(book)
    }

    pub async fn delete_book(&self, id: Uuid) -> ApiResult<()> {
        self.store.delete_book(id).await?;
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::http::StatusCode;

    fn request(isbn: &str) -> CreateBookRequest {
        CreateBookRequest {
            title: "The Hobbit".to_string(),
            author: "J.R.R. Tolkien".to_string(),
            isbn: isbn.to_string(),
            page_count: 310,
        }
    }

    #[tokio::test]
    async fn test_duplicate_isbn_is_a_field_error() {
        let service = BookService::new(Arc::new(MemoryStore::new()));
        service.create_book(request("978-0-261-10295-4")).await.unwrap();

        match service.create_book(request("9780261102954")).await.unwrap_err() {
            ApiError::ValidationError(fields) => {
                assert_eq!(fields.to_string(), "isbn: book with this isbn already exists.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_book_untouched() {
        let service = BookService::new(Arc::new(MemoryStore::new()));
        let book = service.create_book(request("0261102958")).await.unwrap();

        let update = UpdateBookRequest {
            page_count: Some(0),
            ..Default::default()
        };
        let err = service.update_book(book.id, update).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(service.get_book(book.id).await.unwrap().page_count, 310);
    }

    #[tokio::test]
    async fn test_missing_book() {
        let service = BookService::new(Arc::new(MemoryStore::new()));
        let err = service.get_book(Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let err = service.delete_book(Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
