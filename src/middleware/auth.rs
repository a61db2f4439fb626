//! Authentication extractor
//!
//! Resolves the `Authorization: Bearer` header into a [`Caller`].

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::auth::AuthService;
use crate::error::ApiError;
use crate::policy::Caller;

/// Extractor for the request's caller
///
/// A request without an `Authorization` header is anonymous. A header that
/// is present but malformed, expired, or names a deleted user is rejected
/// with 401 even where anonymous access would be allowed.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(caller: Caller) -> impl IntoResponse {
///     format!("admin: {}", caller.is_admin())
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(Caller::Anonymous);
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header must contain a Bearer token".to_string(),
                    )
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);
        let user = auth_service.authenticate(bearer.token()).await.map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::from(e)
        })?;

        Ok(Caller::User(user))
    }
}
