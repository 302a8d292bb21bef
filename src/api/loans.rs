//! Loan lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::loan::{BorrowBook, LoanRecord},
    models::user::UserProfile,
};

use super::{AdminUser, AuthenticatedUser, MsgResponse};

/// A user's own loan history
#[derive(Serialize, ToSchema)]
pub struct LoansResponse {
    pub msg: String,
    pub loans: Vec<LoanRecord>,
}

/// Admin view of a target user's loans with their public profile
#[derive(Serialize, ToSchema)]
pub struct UserLoansResponse {
    pub msg: String,
    pub user: UserProfile,
    pub loans: Vec<LoanRecord>,
}

/// Borrow a book for the authenticated user.
///
/// Fails without side effects when the book or the borrower's account does
/// not exist (404), the user is at the loan cap (403), or the book is
/// already on loan (409).
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = BorrowBook,
    responses(
        (status = 201, description = "Loan created", body = MsgResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Maximum number of open loans reached"),
        (status = 404, description = "Book or account not found"),
        (status = 409, description = "Book already on loan")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BorrowBook>,
) -> AppResult<(StatusCode, Json<MsgResponse>)> {
    state.services.loans.borrow(claims.sub, request.book_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(MsgResponse {
            msg: "the loan has been created successfully".to_string(),
        }),
    ))
}

/// Return a borrowed book.
///
/// Requires an open loan for this exact (user, book) pair; fails without
/// side effects otherwise.
#[utoipa::path(
    put,
    path = "/loans/{book_id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = MsgResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book or open loan not found")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<MsgResponse>> {
    state.services.loans.give_back(claims.sub, book_id).await?;

    Ok(Json(MsgResponse {
        msg: "the book has been returned".to_string(),
    }))
}

/// The authenticated user's open loans.
/// An empty history is a success, reported through the message.
#[utoipa::path(
    get,
    path = "/loans/me",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User's loans", body = LoansResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<LoansResponse>> {
    let loans = state.services.loans.history(claims.sub).await?;

    let msg = if loans.is_empty() {
        "no loans at the moment".to_string()
    } else {
        "List of loans".to_string()
    };

    Ok(Json(LoansResponse { msg, loans }))
}

/// A target user's loans with their public profile (admin only)
#[utoipa::path(
    get,
    path = "/loans/users/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Target user's loans", body = UserLoansResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_loans(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserLoansResponse>> {
    let (user, loans) = state.services.loans.history_with_profile(user_id).await?;

    let msg = if loans.is_empty() {
        "no loans at the moment".to_string()
    } else {
        "List of loans".to_string()
    };

    Ok(Json(UserLoansResponse { msg, user, loans }))
}
