//! Persistence for users, books and loans
//!
//! `LibraryStore` is the single seam between the services and storage. Two
//! implementations exist: [`PgStore`] over PostgreSQL and [`MemoryStore`]
//! for development and tests. Both guarantee that a book's availability is
//! false exactly while an active loan for it exists.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Book, BookChanges, BookFilter, Loan, LoanFilter, NewBook, NewLoan, NewUser, Page, PageRequest,
    User, UserChanges,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub(crate) const DUPLICATE_ISBN: &str = "book with this isbn already exists.";
pub(crate) const DUPLICATE_USERNAME: &str = "A user with that username already exists.";

/// Storage-level failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The named entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Checkout lost the availability compare-and-set
    #[error("book is not available")]
    BookUnavailable,

    #[error("loan already returned")]
    AlreadyReturned,

    /// Delete refused while the entity still has active loans
    #[error("{0} has active loans")]
    ActiveLoans(&'static str),

    /// Unique constraint violation on `field`
    #[error("duplicate {field}")]
    Duplicate {
        field: &'static str,
        message: &'static str,
    },

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub(crate) fn duplicate_isbn() -> Self {
        StoreError::Duplicate {
            field: "isbn",
            message: DUPLICATE_ISBN,
        }
    }

    pub(crate) fn duplicate_username() -> Self {
        StoreError::Duplicate {
            field: "username",
            message: DUPLICATE_USERNAME,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository for the library entities
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Short name for logs and the health endpoint
    fn backend_name(&self) -> &'static str;

    async fn health_check(&self) -> StoreResult<()>;

    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// Users in creation order
    async fn list_users(&self, page: PageRequest) -> StoreResult<Page<User>>;
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<User>;
    /// Fails with `ActiveLoans` while the user still holds a book
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;

    async fn insert_book(&self, book: NewBook) -> StoreResult<Book>;
    async fn find_book(&self, id: Uuid) -> StoreResult<Option<Book>>;
    async fn find_book_by_isbn(&self, isbn: &str) -> StoreResult<Option<Book>>;
    /// Books matching `filter`, in creation order
    async fn list_books(&self, filter: BookFilter, page: PageRequest) -> StoreResult<Page<Book>>;
    /// Catalog fields only; availability is never touched here
    async fn update_book(&self, id: Uuid, changes: BookChanges) -> StoreResult<Book>;
    /// Fails with `ActiveLoans` while the book is checked out
    async fn delete_book(&self, id: Uuid) -> StoreResult<()>;

    async fn find_loan(&self, id: Uuid) -> StoreResult<Option<Loan>>;
    /// Loans matching `filter`, oldest first
    async fn list_loans(&self, filter: LoanFilter, page: PageRequest) -> StoreResult<Page<Loan>>;

    /// Atomically mark the book unavailable and record the loan.
    ///
    /// Of two concurrent calls for one book exactly one succeeds; the other
    /// gets `BookUnavailable`.
    async fn open_loan(&self, loan: NewLoan) -> StoreResult<Loan>;

    /// Atomically archive an active loan and make its book available again.
    async fn close_loan(&self, id: Uuid, return_date: NaiveDate) -> StoreResult<Loan>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_messages() {
        assert_eq!(
            StoreError::duplicate_isbn(),
            StoreError::Duplicate {
                field: "isbn",
                message: "book with this isbn already exists."
            }
        );
        assert!(matches!(
            StoreError::duplicate_username(),
            StoreError::Duplicate { field: "username", .. }
        ));
        assert_eq!(StoreError::NotFound("Book").to_string(), "Book not found");
    }
}
