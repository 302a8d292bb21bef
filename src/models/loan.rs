//! Loan model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Loan model from database.
///
/// `created_at` records when the loan was opened; `returned_at` stays NULL
/// while the loan is open. The row itself is deleted when the book comes
/// back, so open loans are simply the rows that exist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    /// Day the book was borrowed (date only, time zeroed)
    pub loan_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

/// Loan history entry with the borrowed book's title
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanRecord {
    pub book_id: Uuid,
    pub title: String,
    pub loan_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

/// Borrow request
#[derive(Debug, Deserialize, ToSchema)]
pub struct BorrowBook {
    pub book_id: Uuid,
}
