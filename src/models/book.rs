//! Book catalog models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{normalize_isbn, search_terms, validate_isbn, validate_not_blank};

/// Book model
///
/// `availability` is owned by the loan lifecycle: it is false exactly while
/// an active loan exists for the book.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub page_count: i32,
    pub availability: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to add a book to the catalog
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(
        length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters."),
        custom = "validate_not_blank"
    )]
    pub title: String,
    #[validate(
        length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters."),
        custom = "validate_not_blank"
    )]
    pub author: String,
    #[validate(custom = "validate_isbn")]
    pub isbn: String,
    #[validate(range(min = 1, message = "Page count must be a positive number."))]
    pub page_count: i32,
}

impl CreateBookRequest {
    /// Convert a validated request into an insertable row
    pub fn into_new_book(self) -> NewBook {
        let isbn = normalize_isbn(&self.isbn).unwrap_or(self.isbn);
        NewBook {
            title: self.title,
            author: self.author,
            isbn,
            page_count: self.page_count,
        }
    }
}

/// Partial book update; `availability` is deliberately absent
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBookRequest {
    #[validate(
        length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters."),
        custom = "validate_not_blank"
    )]
    pub title: Option<String>,
    #[validate(
        length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters."),
        custom = "validate_not_blank"
    )]
    pub author: Option<String>,
    #[validate(custom = "validate_isbn")]
    pub isbn: Option<String>,
    #[validate(range(min = 1, message = "Page count must be a positive number."))]
    pub page_count: Option<i32>,
}

impl UpdateBookRequest {
    pub fn into_changes(self) -> BookChanges {
        BookChanges {
            title: self.title,
            author: self.author,
            isbn: self
                .isbn
                .map(|isbn| normalize_isbn(&isbn).unwrap_or(isbn)),
            page_count: self.page_count,
        }
    }
}

/// Row to insert into the book table
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub page_count: i32,
}

/// Column changes for a book; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub page_count: Option<i32>,
}

/// Query string for the book list
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksQuery {
    pub page: Option<u32>,
    pub availability: Option<bool>,
    pub search: Option<String>,
}

/// Store-level book filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub availability: Option<bool>,
    /// Every term must match title or author, case-insensitively
    pub search_terms: Vec<String>,
}

impl From<&ListBooksQuery> for BookFilter {
    fn from(query: &ListBooksQuery) -> Self {
        Self {
            availability: query.availability,
            search_terms: query.search.as_deref().map(search_terms).unwrap_or_default(),
        }
    }
}

impl BookFilter {
    /// In-process evaluation of the filter
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(availability) = self.availability {
            if book.availability != availability {
                return false;
            }
        }
        let title = book.title.to_lowercase();
        let author = book.author.to_lowercase();
        self.search_terms.iter().all(|term| {
            let term = term.to_lowercase();
            title.contains(&term) || author.contains(&term)
        })
    }
}
