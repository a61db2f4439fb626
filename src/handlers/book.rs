//! Book catalog API handlers

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

use crate::book_service::BookService;
use crate::error::ApiError;
use crate::models::{
    Book, BookFilter, CreateBookRequest, ListBooksQuery, PageRequest, PageResponse, PageSize,
    UpdateBookRequest,
};
use crate::policy::{authorize, Caller, Operation};

/// GET /api/books?page&availability&search
pub async fn list_books(
    State(service): State<Arc<BookService>>,
    State(page_size): State<PageSize>,
    caller: Caller,
    uri: Uri,
    query: Result<Query<ListBooksQuery>, QueryRejection>,
) -> Result<Json<PageResponse<Book>>, ApiError> {
    authorize(&caller, Operation::ListBooks)?;
    let Query(query) = query?;

    let page = PageRequest::new(query.page, page_size)?;
    let books = service.list_books(BookFilter::from(&query), page).await?;
    Ok(Json(PageResponse::build(books, page, &uri)?))
}

/// POST /api/books
pub async fn create_book(
    State(service): State<Arc<BookService>>,
    caller: Caller,
    body: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    authorize(&caller, Operation::CreateBook)?;
    let Json(request) = body?;

    let book = service.create_book(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /api/books/:id
pub async fn get_book(
    State(service): State<Arc<BookService>>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Book>, ApiError> {
    authorize(&caller, Operation::ReadBook)?;
    let Path(id) = id?;

    Ok(Json(service.get_book(id).await?))
}

/// PUT|PATCH /api/books/:id
pub async fn update_book(
    State(service): State<Arc<BookService>>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    authorize(&caller, Operation::UpdateBook)?;
    let Path(id) = id?;
    let Json(request) = body?;

    Ok(Json(service.update_book(id, request).await?))
}

/// DELETE /api/books/:id
pub async fn delete_book(
    State(service): State<Arc<BookService>>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    authorize(&caller, Operation::DeleteBook)?;
    let Path(id) = id?;

    service.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
