//! Authentication models for the library server

use serde::{Deserialize, Serialize};

/// Credentials exchanged for a token pair
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// Access and refresh tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh: String,
}

/// Freshly minted access token
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access: String,
}
