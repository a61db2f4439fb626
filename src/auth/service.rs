//! Authentication service
//!
//! Password login, token refresh and bearer-token resolution.

use std::sync::Arc;

use thiserror::Error;

use crate::error::ApiError;
use crate::models::{AccessTokenResponse, TokenPairResponse, TokenRequest, User};
use crate::store::{LibraryStore, StoreError};

use super::jwt::{
    generate_access_token, generate_refresh_token, get_user_id_from_claims, verify_token, JwtError,
    TokenType,
};
use super::password::{verify_password, PasswordError};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::UserNotFound => ApiError::Unauthorized("User not found".to_string()),
            AuthError::TokenError(JwtError::TokenExpired) => {
                ApiError::Unauthorized("Token is expired".to_string())
            }
            AuthError::TokenError(_) => {
                ApiError::Unauthorized("Token is invalid".to_string())
            }
            AuthError::Store(e) => e.into(),
            AuthError::Password(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn LibraryStore>,
    jwt_secret: String,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_days: i64,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        store: Arc<dyn LibraryStore>,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
        refresh_token_ttl_days: i64,
    ) -> Self {
        Self {
            store,
            jwt_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_days,
        }
    }

    /// Exchange username and password for an access/refresh pair
    pub async fn login(&self, request: TokenRequest) -> Result<TokenPairResponse, AuthError> {
        let user = self
            .store
            .find_user_by_username(&request.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(request.password, user.password_hash.clone()).await? {
            tracing::warn!(username = %user.username, "Rejected login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let access = generate_access_token(&user, &self.jwt_secret, self.access_token_ttl_seconds)?;
        let refresh = generate_refresh_token(&user, &self.jwt_secret, self.refresh_token_ttl_days)?;

        tracing::info!(user_id = %user.id, "Issued token pair");

        Ok(TokenPairResponse { access, refresh })
    }

    /// Mint a new access token from a refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessTokenResponse, AuthError> {
        let claims = verify_token(refresh_token, &self.jwt_secret, TokenType::Refresh)?;
        let user = self.load_user(&claims).await?;

        let access = generate_access_token(&user, &self.jwt_secret, self.access_token_ttl_seconds)?;
        Ok(AccessTokenResponse { access })
    }

    /// Resolve an access token to the current stored user
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = verify_token(access_token, &self.jwt_secret, TokenType::Access)?;
        self.load_user(&claims).await
    }

    async fn load_user(&self, claims: &super::Claims) -> Result<User, AuthError> {
        let user_id = get_user_id_from_claims(claims)?;
        self.store
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
