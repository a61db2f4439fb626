//! Loan models for the library server
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{ApiError, FieldErrors};

/// Loan model
///
/// A loan is active until it is returned; returned loans are kept as history.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Loan {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(rename = "book")]
    pub book_id: Uuid,
    pub book_title: String,
    pub loan_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub is_returned: bool,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        !self.is_returned
    }
}

/// Request to borrow a book
///
/// Fields are taken as raw JSON so that a missing or malformed value is
/// reported against its own field instead of rejecting the whole body.
#[derive(Debug, Default, Deserialize)]
pub struct CreateLoanRequest {
    pub book: Option<Value>,
    pub due_date: Option<Value>,
}

impl CreateLoanRequest {
    pub fn new(book: Uuid, due_date: NaiveDate) -> Self {
        Self {
            book: Some(Value::String(book.to_string())),
            due_date: Some(Value::String(due_date.to_string())),
        }
    }

    /// Parse both fields, collecting every error
    pub fn required(self) -> Result<(Uuid, NaiveDate), ApiError> {
        let mut errors = FieldErrors::new();

        let book = match self.book {
            None => {
                errors.add("book", "This field is required.");
                None
            }
            Some(value) => {
                let parsed = value.as_str().and_then(|s| Uuid::parse_str(s).ok());
                if parsed.is_none() {
                    errors.add("book", "Must be a valid UUID.");
                }
                parsed
            }
        };

        let due_date = match self.due_date {
            None => {
                errors.add("due_date", "This field is required.");
                None
            }
            Some(value) => {
                let parsed = value
                    .as_str()
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
                if parsed.is_none() {
                    errors.add(
                        "due_date",
                        "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
                    );
                }
                parsed
            }
        };

        match (book, due_date) {
            (Some(book), Some(due_date)) if errors.is_empty() => Ok((book, due_date)),
            _ => Err(ApiError::ValidationError(errors)),
        }
    }
}

/// Row inserted when a book is checked out
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub loan_date: DateTime<Utc>,
    pub due_date: NaiveDate,
}

/// Store-level loan filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoanFilter {
    /// Restrict to one borrower; `None` lists every loan
    pub user_id: Option<Uuid>,
    pub is_returned: Option<bool>,
}

impl LoanFilter {
    pub fn matches(&self, loan: &Loan) -> bool {
        self.user_id.map_or(true, |user_id| loan.user_id == user_id)
            && self
                .is_returned
                .map_or(true, |is_returned| loan.is_returned == is_returned)
    }
}

/// Query string for the loan list
#[derive(Debug, Default, Deserialize)]
pub struct ListLoansQuery {
    pub page: Option<u32>,
    pub is_returned: Option<bool>,
}

/// Body returned after a successful return
#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnLoanResponse {
    pub message: String,
}

impl ReturnLoanResponse {
    pub fn returned() -> Self {
        Self {
            message: "Book returned successfully.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_wire_names() {
        let loan = Loan {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            book_id: Uuid::now_v7(),
            book_title: "Dune".to_string(),
            loan_date: Utc::now(),
            due_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            return_date: None,
            is_returned: false,
        };
        let value = serde_json::to_value(&loan).unwrap();
        assert_eq!(value["user"], loan.user_id.to_string());
        assert_eq!(value["book"], loan.book_id.to_string());
        assert_eq!(value["due_date"], "2030-01-01");
        assert!(value["return_date"].is_null());
        assert!(loan.is_active());
    }

    #[test]
    fn test_missing_fields_are_reported_together() {
        let err = CreateLoanRequest::default().required().unwrap_err();
        match err {
            ApiError::ValidationError(fields) => {
                assert_eq!(
                    fields.to_string(),
                    "book: This field is required.; due_date: This field is required."
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_fields_are_reported_per_field() {
        let request = CreateLoanRequest {
            book: Some(serde_json::json!(42)),
            due_date: Some(serde_json::json!("not-a-date")),
        };
        match request.required().unwrap_err() {
            ApiError::ValidationError(fields) => {
                assert_eq!(
                    fields.to_string(),
                    "book: Must be a valid UUID.; due_date: Date has wrong format. \
                     Use one of these formats instead: YYYY-MM-DD."
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let book = Uuid::now_v7();
        let due = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();
        assert_eq!(CreateLoanRequest::new(book, due).required().unwrap(), (book, due));
    }

    #[test]
    fn test_filter_scopes_by_user_and_state() {
        let owner = Uuid::now_v7();
        let loan = Loan {
            id: Uuid::now_v7(),
            user_id: owner,
            book_id: Uuid::now_v7(),
            book_title: "Emma".to_string(),
            loan_date: Utc::now(),
            due_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            return_date: None,
            is_returned: false,
        };

        assert!(LoanFilter::default().matches(&loan));
        assert!(LoanFilter { user_id: Some(owner), is_returned: Some(false) }.matches(&loan));
        assert!(!LoanFilter { user_id: Some(Uuid::now_v7()), is_returned: None }.matches(&loan));
        assert!(!LoanFilter { user_id: None, is_returned: Some(true) }.matches(&loan));
    }
}
