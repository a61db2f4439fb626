//! Loan API handlers: checkout, return and loan history

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{StatusCode, Uri},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::loan_service::LoanService;
use crate::models::{
    CreateLoanRequest, ListLoansQuery, Loan, PageRequest, PageResponse, PageSize,
    ReturnLoanResponse,
};
use crate::policy::{require_user, Caller, Operation};

/// GET /api/loans?page&is_returned
///
/// Admins see every loan, other users only their own.
pub async fn list_loans(
    State(service): State<Arc<LoanService>>,
    State(page_size): State<PageSize>,
    caller: Caller,
    uri: Uri,
    query: Result<Query<ListLoansQuery>, QueryRejection>,
) -> Result<Json<PageResponse<Loan>>, ApiError> {
    let user = require_user(&caller, Operation::ListLoans)?;
    let Query(query) = query?;

    let page = PageRequest::new(query.page, page_size)?;
    let loans = service.list_loans(user, query.is_returned, page).await?;
    Ok(Json(PageResponse::build(loans, page, &uri)?))
}

/// POST /api/loans - Borrow a book
pub async fn create_loan(
    State(service): State<Arc<LoanService>>,
    caller: Caller,
    body: Result<Json<CreateLoanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Loan>), ApiError> {
    let user = require_user(&caller, Operation::CreateLoan)?;
    let Json(request) = body?;

    let loan = service.create_loan(user, request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// GET /api/loans/:id
pub async fn get_loan(
    State(service): State<Arc<LoanService>>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Loan>, ApiError> {
    let user = require_user(&caller, Operation::ReadLoan)?;
    let Path(id) = id?;

    Ok(Json(service.get_loan(user, id).await?))
}

/// POST /api/loans/:id/return
pub async fn return_loan(
    State(service): State<Arc<LoanService>>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReturnLoanResponse>, ApiError> {
    let user = require_user(&caller, Operation::ReturnLoan)?;
    let Path(id) = id?;

    service.return_loan(user, id).await?;
    Ok(Json(ReturnLoanResponse::returned()))
}
