//! PostgreSQL implementation of [`LibraryStore`]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{LibraryStore, StoreError, StoreResult};
use crate::db;
use crate::models::{
    Book, BookChanges, BookFilter, Loan, LoanFilter, NewBook, NewLoan, NewUser, Page, PageRequest,
    User, UserChanges,
};

const LOAN_SELECT: &str = "SELECT l.id, l.user_id, l.book_id, b.title AS book_title, \
     l.loan_date, l.due_date, l.return_date, l.is_returned \
     FROM loans l JOIN books b ON b.id = l.book_id";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.constraint() {
                Some("users_username_key") => return StoreError::duplicate_username(),
                Some("books_isbn_key") => return StoreError::duplicate_isbn(),
                Some("loans_one_active_per_book") => return StoreError::BookUnavailable,
                Some("loans_user_id_fkey") => return StoreError::NotFound("User"),
                Some("loans_book_id_fkey") => return StoreError::NotFound("Book"),
                _ => {}
            }
        }
        StoreError::Database(err.to_string())
    }
}

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `%term%` with LIKE metacharacters escaped
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_book_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    if let Some(availability) = filter.availability {
        builder.push(" AND availability = ");
        builder.push_bind(availability);
    }
    for term in &filter.search_terms {
        let pattern = like_pattern(term);
        builder.push(" AND (title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR author ILIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }
}

fn push_loan_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &LoanFilter) {
    if let Some(user_id) = filter.user_id {
        builder.push(" AND l.user_id = ");
        builder.push_bind(user_id);
    }
    if let Some(is_returned) = filter.is_returned {
        builder.push(" AND l.is_returned = ");
        builder.push_bind(is_returned);
    }
}

fn total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

#[async_trait]
impl LibraryStore for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<()> {
        db::check_health(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.role)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self, page: PageRequest) -> StoreResult<Page<User>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at, id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items,
            total: total(count),
        })
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.role)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or(StoreError::NotFound("User"))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        // Row lock keeps new loans for this user out until we commit
        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound("User"));
        }

        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM loans WHERE user_id = $1 AND NOT is_returned)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if active {
            return Err(StoreError::ActiveLoans("user"));
        }

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_book(&self, book: NewBook) -> StoreResult<Book> {
        let now = Utc::now();
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author, isbn, page_count, availability, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(book.title)
        .bind(book.author)
        .bind(book.isbn)
        .bind(book.page_count)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    async fn find_book(&self, id: Uuid) -> StoreResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn find_book_by_isbn(&self, isbn: &str) -> StoreResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn list_books(&self, filter: BookFilter, page: PageRequest) -> StoreResult<Page<Book>> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM books WHERE TRUE");
        push_book_filter(&mut count_builder, &filter);
        let count: i64 = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut query_builder = QueryBuilder::new("SELECT * FROM books WHERE TRUE");
        push_book_filter(&mut query_builder, &filter);
        query_builder.push(" ORDER BY created_at, id LIMIT ");
        query_builder.push_bind(page.limit());
        query_builder.push(" OFFSET ");
        query_builder.push_bind(page.offset());

        let items = query_builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            total: total(count),
        })
    }

    async fn update_book(&self, id: Uuid, changes: BookChanges) -> StoreResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                isbn = COALESCE($4, isbn),
                page_count = COALESCE($5, page_count),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.author)
        .bind(changes.isbn)
        .bind(changes.page_count)
        .fetch_optional(&self.pool)
        .await?;

        book.ok_or(StoreError::NotFound("Book"))
    }

    async fn delete_book(&self, id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let availability: Option<bool> =
            sqlx::query_scalar("SELECT availability FROM books WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        match availability {
            None => return Err(StoreError::NotFound("Book")),
            Some(false) => return Err(StoreError::ActiveLoans("book")),
            Some(true) => {}
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_loan(&self, id: Uuid) -> StoreResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(&format!("{} WHERE l.id = $1", LOAN_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(loan)
    }

    async fn list_loans(&self, filter: LoanFilter, page: PageRequest) -> StoreResult<Page<Loan>> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM loans l WHERE TRUE");
        push_loan_filter(&mut count_builder, &filter);
        let count: i64 = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut query_builder = QueryBuilder::new(LOAN_SELECT);
        query_builder.push(" WHERE TRUE");
        push_loan_filter(&mut query_builder, &filter);
        query_builder.push(" ORDER BY l.loan_date, l.id LIMIT ");
        query_builder.push_bind(page.limit());
        query_builder.push(" OFFSET ");
        query_builder.push_bind(page.offset());

        let items = query_builder
            .build_query_as::<Loan>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            total: total(count),
        })
    }

    async fn open_loan(&self, loan: NewLoan) -> StoreResult<Loan> {
        let mut tx = self.pool.begin().await?;

        // Compare-and-set on availability; the row lock serializes racing checkouts
        let book_title: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE books
            SET availability = FALSE, updated_at = NOW()
            WHERE id = $1 AND availability = TRUE
            RETURNING title
            "#,
        )
        .bind(loan.book_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(book_title) = book_title else {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE id = $1)")
                .bind(loan.book_id)
                .fetch_one(&mut *tx)
                .await?;
            return Err(if exists {
                StoreError::BookUnavailable
            } else {
                StoreError::NotFound("Book")
            });
        };

        let id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO loans (id, user_id, book_id, loan_date, due_date, return_date, is_returned)
            VALUES ($1, $2, $3, $4, $5, NULL, FALSE)
            "#,
        )
        .bind(id)
        .bind(loan.user_id)
        .bind(loan.book_id)
        .bind(loan.loan_date)
        .bind(loan.due_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Loan {
            id,
            user_id: loan.user_id,
            book_id: loan.book_id,
            book_title,
            loan_date: loan.loan_date,
            due_date: loan.due_date,
            return_date: None,
            is_returned: false,
        })
    }

    async fn close_loan(&self, id: Uuid, return_date: NaiveDate) -> StoreResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>(&format!("{} WHERE l.id = $1 FOR UPDATE OF l", LOAN_SELECT))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound("Loan"))?;

        if loan.is_returned {
            return Err(StoreError::AlreadyReturned);
        }

        sqlx::query("UPDATE loans SET is_returned = TRUE, return_date = $2 WHERE id = $1")
            .bind(id)
            .bind(return_date)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE books SET availability = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Loan {
            return_date: Some(return_date),
            is_returned: true,
            ..loan
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("tolkien"), "%tolkien%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[test]
    fn test_negative_count_clamps() {
        assert_eq!(total(-1), 0);
        assert_eq!(total(42), 42);
    }
}
