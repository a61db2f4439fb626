//! Authentication module for the library server
//!
//! - Username/password login with bcrypt-hashed credentials
//! - JWT access and refresh token generation and validation
//! - Resolution of bearer tokens to stored users

mod jwt;
mod password;
mod service;

pub use jwt::{generate_access_token, generate_refresh_token, verify_token, Claims, JwtError, TokenType};
pub use password::{hash_password, verify_password, PasswordError};
pub use service::{AuthError, AuthService};
