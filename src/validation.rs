//! Input rules shared by request DTOs and services

use std::borrow::Cow;

use chrono::NaiveDate;
use validator::ValidationError;

use crate::error::ApiError;

/// Strip hyphens and spaces and check the result is a 10 or 13 digit ISBN.
pub fn normalize_isbn(raw: &str) -> Result<String, &'static str> {
    let cleaned: String = raw.chars().filter(|c| *c != '-' && *c != ' ').collect();
    if cleaned.is_empty() {
        return Err("ISBN is required.");
    }
    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err("ISBN must contain only digits (and hyphens/spaces).");
    }
    if cleaned.len() != 10 && cleaned.len() != 13 {
        return Err("ISBN must be 10 or 13 digits long.");
    }
    Ok(cleaned)
}

pub fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    normalize_isbn(isbn)
        .map(|_| ())
        .map_err(|message| with_message("isbn", message))
}

/// Letters, digits and @/./+/-/_ only
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if username.chars().all(allowed) {
        Ok(())
    } else {
        Err(with_message(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ))
    }
}

/// Reject titles and names made only of whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(with_message("blank", "This field may not be blank."))
    } else {
        Ok(())
    }
}

/// A due date must be strictly after `today`.
pub fn validate_due_date(due_date: NaiveDate, today: NaiveDate) -> Result<(), ApiError> {
    if due_date <= today {
        return Err(ApiError::validation(
            "due_date",
            "Due date must be in the future.",
        ));
    }
    Ok(())
}

/// Split a search query on whitespace and commas.
pub fn search_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

fn with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}
