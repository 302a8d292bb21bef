//! Book catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{Book, BookPayload, BookSummary},
};

use super::{AdminUser, AuthenticatedUser, MsgResponse};

/// Full catalog listing
#[derive(Serialize, ToSchema)]
pub struct BooksResponse {
    pub msg: String,
    pub books: Vec<BookSummary>,
}

/// Listing of books free to borrow
#[derive(Serialize, ToSchema)]
pub struct AvailableBooksResponse {
    pub msg: String,
    pub availablebooks: Vec<BookSummary>,
}

/// Single-book response
#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub msg: String,
    pub book: Book,
}

/// List books currently free to borrow.
/// An empty catalog is a success, reported through the message.
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of available books", body = AvailableBooksResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_available_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<AvailableBooksResponse>> {
    let availablebooks = state.services.catalog.list_available().await?;

    let msg = if availablebooks.is_empty() {
        "no book is free at the moment".to_string()
    } else {
        "List of available books".to_string()
    };

    Ok(Json(AvailableBooksResponse { msg, availablebooks }))
}

/// List the whole catalog (admin only)
#[utoipa::path(
    get,
    path = "/books/all",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of all books", body = BooksResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<BooksResponse>> {
    let books = state.services.catalog.list_books().await?;

    let msg = if books.is_empty() {
        "no books registered at the moment".to_string()
    } else {
        "List of registered books".to_string()
    };

    Ok(Json(BooksResponse { msg, books }))
}

/// Create a new book (admin only)
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 403, description = "Admin privileges required"),
        (status = 409, description = "A book with this title already exists"),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<BookPayload>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    payload.validate()?;

    let book = state.services.catalog.create_book(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            msg: format!("the book {} has been created", book.title),
            book,
        }),
    ))
}

/// Overwrite an existing book's catalog data (admin only).
/// This is a full-field update: omitted optional fields are stored as sent.
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "A book with this title already exists"),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookPayload>,
) -> AppResult<Json<BookResponse>> {
    payload.validate()?;

    let book = state.services.catalog.update_book(id, payload).await?;

    Ok(Json(BookResponse {
        msg: format!("the book {} has been updated", book.title),
        book,
    }))
}

/// Delete a book (admin only)
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = MsgResponse),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MsgResponse>> {
    let book = state.services.catalog.delete_book(id).await?;

    Ok(Json(MsgResponse {
        msg: format!("the book {} has been deleted successfully", book.title),
    }))
}
