//! User-related API handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{StatusCode, Uri},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    CreateUserRequest, PageRequest, PageResponse, PageSize, UpdateUserRequest, UserResponse,
};
use crate::policy::{authorize, Caller, Operation};
use crate::user_service::UserService;

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
}

/// GET /api/users
pub async fn list_users(
    State(service): State<Arc<UserService>>,
    State(page_size): State<PageSize>,
    caller: Caller,
    uri: Uri,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<PageResponse<UserResponse>>, ApiError> {
    authorize(&caller, Operation::ListUsers)?;
    let Query(query) = query?;

    let page = PageRequest::new(query.page, page_size)?;
    let users = service.list_users(page).await?.map(UserResponse::from);
    Ok(Json(PageResponse::build(users, page, &uri)?))
}

/// POST /api/users - Register a new account
pub async fn create_user(
    State(service): State<Arc<UserService>>,
    caller: Caller,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    authorize(&caller, Operation::RegisterUser)?;
    let Json(request) = body?;

    let user = service.register(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/users/:id
pub async fn get_user(
    State(service): State<Arc<UserService>>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    authorize(&caller, Operation::ReadUser)?;
    let Path(id) = id?;

    let user = service.get_user(id).await?;
    Ok(Json(user.into()))
}

/// PUT|PATCH /api/users/:id
pub async fn update_user(
    State(service): State<Arc<UserService>>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    authorize(&caller, Operation::UpdateUser)?;
    let Path(id) = id?;
    let Json(request) = body?;

    let user = service.update_user(id, request).await?;
    Ok(Json(user.into()))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(service): State<Arc<UserService>>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    authorize(&caller, Operation::DeleteUser)?;
    let Path(id) = id?;

    service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
