//! Token HTTP handlers
//!
//! Endpoints for password login and access-token refresh.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use crate::auth::AuthService;
use crate::error::ApiError;
use crate::models::{AccessTokenResponse, RefreshTokenRequest, TokenPairResponse, TokenRequest};
use crate::policy::{authorize, Caller, Operation};

/// POST /api/token - Exchange credentials for an access/refresh pair
pub async fn obtain_token(
    State(auth_service): State<Arc<AuthService>>,
    caller: Caller,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    authorize(&caller, Operation::ObtainToken)?;
    let Json(req) = body?;

    let tokens = auth_service.login(req).await?;
    Ok(Json(tokens))
}

/// POST /api/token/refresh - Mint a new access token
pub async fn refresh_token(
    State(auth_service): State<Arc<AuthService>>,
    caller: Caller,
    body: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    authorize(&caller, Operation::RefreshToken)?;
    let Json(req) = body?;

    let token = auth_service.refresh(&req.refresh).await?;
    Ok(Json(token))
}
