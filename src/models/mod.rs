//! Data models for the library server

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_username;

pub mod auth;
pub mod book;
pub mod loan;
pub mod pagination;

pub use auth::*;
pub use book::*;
pub use loan::*;
pub use pagination::*;

/// User model
#[derive(Debug, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// User roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Default)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Registration payload
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters."),
        custom = "validate_username"
    )]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
    pub password: String,
    /// Honoured only when an admin creates the account
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Partial user update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters."),
        custom = "validate_username"
    )]
    pub username: Option<String>,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
    pub password: Option<String>,
    pub role: Option<UserRole>,
}

/// Row to insert into the user table
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Column changes for a user; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(username: &str, email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: None,
        }
    }

    #[test]
    fn test_registration_validation() {
        assert!(registration("reader", "reader@example.com", "longenough")
            .validate()
            .is_ok());

        let errors = registration("reader", "not-an-email", "short")
            .validate()
            .unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("username"));

        assert!(registration("bad name", "reader@example.com", "longenough")
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_update_validates_present_fields_only() {
        assert!(UpdateUserRequest::default().validate().is_ok());

        let request = UpdateUserRequest {
            password: Some("short".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        let role: UserRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, UserRole::User);
        assert!(serde_json::from_str::<UserRole>("\"superuser\"").is_err());
        assert_eq!(UserRole::default(), UserRole::User);
    }
}
