//! In-process implementation of [`LibraryStore`]
//!
//! All tables sit behind one `RwLock`, so every mutating operation, checkout
//! and return included, is atomic with respect to every other. Ids are UUIDv7,
//! which makes `BTreeMap` iteration order the creation order.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LibraryStore, StoreError, StoreResult};
use crate::models::{
    Book, BookChanges, BookFilter, Loan, LoanFilter, NewBook, NewLoan, NewUser, Page, PageRequest,
    User, UserChanges,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    books: BTreeMap<Uuid, Book>,
    loans: BTreeMap<Uuid, Loan>,
}

impl Tables {
    /// Loan with the current title of its book
    fn hydrate(&self, loan: &Loan) -> Loan {
        let mut loan = loan.clone();
        if let Some(book) = self.books.get(&loan.book_id) {
            loan.book_title.clone_from(&book.title);
        }
        loan
    }

    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|user| user.username == username && Some(user.id) != except)
    }

    fn isbn_taken(&self, isbn: &str, except: Option<Uuid>) -> bool {
        self.books
            .values()
            .any(|book| book.isbn == isbn && Some(book.id) != except)
    }
}

fn paginate<T: Clone>(items: Vec<&T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
        .cloned()
        .collect();
    Page { items, total }
}

/// Store kept entirely in memory; contents are lost on restart
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(&user.username, None) {
            return Err(StoreError::duplicate_username());
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn list_users(&self, page: PageRequest) -> StoreResult<Page<User>> {
        let tables = self.tables.read().await;
        Ok(paginate(tables.users.values().collect(), page))
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if let Some(username) = &changes.username {
            if tables.username_taken(username, Some(id)) {
                return Err(StoreError::duplicate_username());
            }
        }

        let user = tables
            .users
            .get_mut(&id)
            .ok_or(StoreError::NotFound("User"))?;
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(StoreError::NotFound("User"));
        }
        if tables
            .loans
            .values()
            .any(|loan| loan.user_id == id && loan.is_active())
        {
            return Err(StoreError::ActiveLoans("user"));
        }

        tables.loans.retain(|_, loan| loan.user_id != id);
        tables.users.remove(&id);
        Ok(())
    }

    async fn insert_book(&self, book: NewBook) -> StoreResult<Book> {
        let mut tables = self.tables.write().await;
        if tables.isbn_taken(&book.isbn, None) {
            return Err(StoreError::duplicate_isbn());
        }

        let now = Utc::now();
        let book = Book {
            id: Uuid::now_v7(),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            page_count: book.page_count,
            availability: true,
            created_at: now,
            updated_at: now,
        };
        tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn find_book(&self, id: Uuid) -> StoreResult<Option<Book>> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn find_book_by_isbn(&self, isbn: &str) -> StoreResult<Option<Book>> {
        let tables = self.tables.read().await;
        Ok(tables.books.values().find(|book| book.isbn == isbn).cloned())
    }

    async fn list_books(&self, filter: BookFilter, page: PageRequest) -> StoreResult<Page<Book>> {
        let tables = self.tables.read().await;
        let matching: Vec<&Book> = tables
            .books
            .values()
            .filter(|book| filter.matches(book))
            .collect();
        Ok(paginate(matching, page))
    }

    async fn update_book(&self, id: Uuid, changes: BookChanges) -> StoreResult<Book> {
        let mut tables = self.tables.write().await;
        if let Some(isbn) = &changes.isbn {
            if tables.isbn_taken(isbn, Some(id)) {
                return Err(StoreError::duplicate_isbn());
            }
        }

        let book = tables
            .books
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Book"))?;
        if let Some(title) = changes.title {
            book.title = title;
        }
        if let Some(author) = changes.author {
            book.author = author;
        }
        if let Some(isbn) = changes.isbn {
            book.isbn = isbn;
        }
        if let Some(page_count) = changes.page_count {
            book.page_count = page_count;
        }
        book.updated_at = Utc::now();
        Ok(book.clone())
    }

    async fn delete_book(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let book = tables.books.get(&id).ok_or(StoreError::NotFound("Book"))?;
        if !book.availability {
            return Err(StoreError::ActiveLoans("book"));
        }

        tables.loans.retain(|_, loan| loan.book_id != id);
        tables.books.remove(&id);
        Ok(())
    }

    async fn find_loan(&self, id: Uuid) -> StoreResult<Option<Loan>> {
        let tables = self.tables.read().await;
        Ok(tables.loans.get(&id).map(|loan| tables.hydrate(loan)))
    }

    async fn list_loans(&self, filter: LoanFilter, page: PageRequest) -> StoreResult<Page<Loan>> {
        let tables = self.tables.read().await;
        let matching: Vec<&Loan> = tables
            .loans
            .values()
            .filter(|loan| filter.matches(loan))
            .collect();
        Ok(paginate(matching, page).map(|loan| tables.hydrate(&loan)))
    }

    async fn open_loan(&self, loan: NewLoan) -> StoreResult<Loan> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&loan.user_id) {
            return Err(StoreError::NotFound("User"));
        }

        let book = tables
            .books
            .get_mut(&loan.book_id)
            .ok_or(StoreError::NotFound("Book"))?;
        if !book.availability {
            return Err(StoreError::BookUnavailable);
        }
        book.availability = false;
        book.updated_at = Utc::now();
        let book_title = book.title.clone();

        let loan = Loan {
            id: Uuid::now_v7(),
            user_id: loan.user_id,
            book_id: loan.book_id,
            book_title,
            loan_date: loan.loan_date,
            due_date: loan.due_date,
            return_date: None,
            is_returned: false,
        };
        tables.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    async fn close_loan(&self, id: Uuid, return_date: NaiveDate) -> StoreResult<Loan> {
        let mut tables = self.tables.write().await;
        let loan = tables.loans.get_mut(&id).ok_or(StoreError::NotFound("Loan"))?;
        if loan.is_returned {
            return Err(StoreError::AlreadyReturned);
        }
        loan.is_returned = true;
        loan.return_date = Some(return_date);
        let loan = loan.clone();

        if let Some(book) = tables.books.get_mut(&loan.book_id) {
            book.availability = true;
            book.updated_at = Utc::now();
        }
        Ok(tables.hydrate(&loan))
    }
}
