//! Loan service layer - Business logic for the borrow/return lifecycle

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{CreateLoanRequest, Loan, LoanFilter, NewLoan, Page, PageRequest, User};
use crate::policy::LoanScope;
use crate::store::LibraryStore;
use crate::validation::validate_due_date;

/// Loan service for managing loan lifecycle
///
/// The service is the only writer of loan state and of book availability;
/// both transitions are delegated to a single atomic store operation.
#[derive(Clone)]
pub struct LoanService {
    store: Arc<dyn LibraryStore>,
}

impl LoanService {
    /// Create a new loan service instance
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }

    /// Check a book out to `borrower`
    pub async fn create_loan(&self, borrower: &User, request: CreateLoanRequest) -> ApiResult<Loan> {
        let (book_id, due_date) = request.required()?;

        self.store
            .find_book(book_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

        let loan_date = Utc::now();
        validate_due_date(due_date, loan_date.date_naive())?;

        let loan = self
            .store
            .open_loan(NewLoan {
                user_id: borrower.id,
                book_id,
                loan_date,
                due_date,
            })
            .await
            .map_err(|e| {
                tracing::info!(%book_id, user_id = %borrower.id, error = %e, "Checkout refused");
                ApiError::from(e)
            })?;

        tracing::info!(
            loan_id = %loan.id,
            book_id = %loan.book_id,
            user_id = %loan.user_id,
            due_date = %loan.due_date,
            "Loan created"
        );

        Ok(loan)
    }

    /// Return a loan on behalf of its borrower or an admin
    pub async fn return_loan(&self, requestor: &User, loan_id: Uuid) -> ApiResult<Loan> {
        let loan = self.get_loan(requestor, loan_id).await?;

        let returned = self
            .store
            .close_loan(loan.id, Utc::now().date_naive())
            .await?;

        tracing::info!(
            loan_id = %returned.id,
            book_id = %returned.book_id,
            returned_by = %requestor.id,
            "Loan returned"
        );

        Ok(returned)
    }

    /// One page of the loans visible to `requestor`
    pub async fn list_loans(
        &self,
        requestor: &User,
        is_returned: Option<bool>,
        page: PageRequest,
    ) -> ApiResult<Page<Loan>> {
        let scope = LoanScope::for_user(requestor);
        let filter = LoanFilter {
            user_id: scope.user_id(),
            is_returned: is_returned.or(scope.default_is_returned()),
        };
        Ok(self.store.list_loans(filter, page).await?)
    }

    /// A single loan; other borrowers' loans are reported as missing
    pub async fn get_loan(&self, requestor: &User, loan_id: Uuid) -> ApiResult<Loan> {
        let loan = self
            .store
            .find_loan(loan_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        LoanScope::for_user(requestor).check(loan)
    }
}
