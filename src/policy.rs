//! Access policy
//!
//! Every API operation maps to one [`Rule`]; [`authorize`] is the only place
//! that turns a rule and a caller into allow / 401 / 403.

use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Loan, User};

/// Who is making the request
#[derive(Debug, Clone)]
pub enum Caller {
    Anonymous,
    User(User),
}

impl Caller {
    pub fn user(&self) -> Option<&User> {
        match self {
            Caller::Anonymous => None,
            Caller::User(user) => Some(user),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(User::is_admin)
    }
}

/// Who may perform an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Anyone,
    Authenticated,
    AdminOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RegisterUser,
    ListUsers,
    ReadUser,
    UpdateUser,
    DeleteUser,
    ListBooks,
    ReadBook,
    CreateBook,
    UpdateBook,
    DeleteBook,
    ListLoans,
    ReadLoan,
    CreateLoan,
    ReturnLoan,
    ObtainToken,
    RefreshToken,
}

impl Operation {
    pub const fn rule(self) -> Rule {
        match self {
            Operation::RegisterUser
            | Operation::ListBooks
            | Operation::ReadBook
            | Operation::ObtainToken
            | Operation::RefreshToken => Rule::Anyone,
            Operation::ListUsers
            | Operation::ReadUser
            | Operation::ListLoans
            | Operation::ReadLoan
            | Operation::CreateLoan
            | Operation::ReturnLoan => Rule::Authenticated,
            Operation::UpdateUser
            | Operation::DeleteUser
            | Operation::CreateBook
            | Operation::UpdateBook
            | Operation::DeleteBook => Rule::AdminOnly,
        }
    }
}

/// Check `caller` against the rule for `operation`.
///
/// Anonymous callers are told to authenticate (401); authenticated
/// non-admins hitting an admin operation are refused (403).
pub fn authorize(caller: &Caller, operation: Operation) -> Result<(), ApiError> {
    match (operation.rule(), caller) {
        (Rule::Anyone, _) => Ok(()),
        (_, Caller::Anonymous) => Err(ApiError::Unauthorized(
            "Authentication credentials were not provided.".to_string(),
        )),
        (Rule::Authenticated, Caller::User(_)) => Ok(()),
        (Rule::AdminOnly, Caller::User(user)) if user.is_admin() => Ok(()),
        (Rule::AdminOnly, Caller::User(user)) => {
            tracing::warn!(user_id = %user.id, ?operation, "Non-admin denied");
            Err(ApiError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            ))
        }
    }
}

/// [`authorize`] for operations that need a user, returning that user
pub fn require_user(caller: &Caller, operation: Operation) -> Result<&User, ApiError> {
    authorize(caller, operation)?;
    caller.user().ok_or_else(|| {
        ApiError::Unauthorized("Authentication credentials were not provided.".to_string())
    })
}

/// Which loans a user may see or return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanScope {
    All,
    Borrower(Uuid),
}

impl LoanScope {
    pub fn for_user(user: &User) -> Self {
        if user.is_admin() {
            LoanScope::All
        } else {
            LoanScope::Borrower(user.id)
        }
    }

    /// Borrower restriction for list queries
    pub fn user_id(self) -> Option<Uuid> {
        match self {
            LoanScope::All => None,
            LoanScope::Borrower(user_id) => Some(user_id),
        }
    }

    /// Borrowers list only their active loans unless they ask for a state
    pub fn default_is_returned(self) -> Option<bool> {
        match self {
            LoanScope::All => None,
            LoanScope::Borrower(_) => Some(false),
        }
    }

    /// Loans outside the scope are reported as missing, never as forbidden
    pub fn check(self, loan: Loan) -> Result<Loan, ApiError> {
        match self {
            LoanScope::Borrower(user_id) if loan.user_id != user_id => {
                Err(ApiError::NotFound("Loan not found".to_string()))
            }
            _ => Ok(loan),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use axum::http::StatusCode;
    use chrono::{NaiveDate, Utc};

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::now_v7(),
            username: "someone".to_string(),
            email: "someone@example.com".to_string(),
            password_hash: "hash".to_string(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn loan_for(user_id: Uuid) -> Loan {
        Loan {
            id: Uuid::now_v7(),
            user_id,
            book_id: Uuid::now_v7(),
            book_title: "Dune".to_string(),
            loan_date: Utc::now(),
            due_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            return_date: None,
            is_returned: false,
        }
    }

    fn status(caller: &Caller, operation: Operation) -> Option<StatusCode> {
        authorize(caller, operation).err().map(|e| e.status_code())
    }

    #[test]
    fn test_policy_table() {
        let anonymous = Caller::Anonymous;
        let member = Caller::User(user(UserRole::User));
        let admin = Caller::User(user(UserRole::Admin));

        for operation in [Operation::RegisterUser, Operation::ListBooks, Operation::ObtainToken] {
            assert_eq!(status(&anonymous, operation), None);
        }
        for operation in [Operation::ListUsers, Operation::CreateLoan, Operation::ReturnLoan] {
            assert_eq!(status(&anonymous, operation), Some(StatusCode::UNAUTHORIZED));
            assert_eq!(status(&member, operation), None);
        }
        for operation in [Operation::CreateBook, Operation::UpdateUser, Operation::DeleteBook] {
            assert_eq!(status(&anonymous, operation), Some(StatusCode::UNAUTHORIZED));
            assert_eq!(status(&member, operation), Some(StatusCode::FORBIDDEN));
            assert_eq!(status(&admin, operation), None);
        }
    }

    #[test]
    fn test_require_user() {
        let member = Caller::User(user(UserRole::User));
        assert!(require_user(&member, Operation::CreateLoan).is_ok());
        assert!(require_user(&Caller::Anonymous, Operation::CreateLoan).is_err());
    }

    #[test]
    fn test_loan_scope_hides_foreign_loans() {
        let member = user(UserRole::User);
        let admin = user(UserRole::Admin);
        let foreign = loan_for(Uuid::now_v7());

        let err = LoanScope::for_user(&member).check(foreign.clone()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(LoanScope::for_user(&member).check(loan_for(member.id)).is_ok());
        assert!(LoanScope::for_user(&admin).check(foreign).is_ok());

        assert_eq!(LoanScope::for_user(&member).user_id(), Some(member.id));
        assert_eq!(LoanScope::for_user(&admin).user_id(), None);
        assert_eq!(LoanScope::for_user(&member).default_is_returned(), Some(false));
        assert_eq!(LoanScope::for_user(&admin).default_is_returned(), None);
    }
}
