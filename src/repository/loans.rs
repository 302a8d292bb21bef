//! Loans repository for database operations.
//!
//! Borrow and return each touch three records (book state, loan row, user
//! loan counter). Both run inside a single transaction with conditional
//! updates, so a concurrent conflicting request observes either all three
//! effects or none of them.

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanRecord},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Open loans for a user, most recent first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<LoanRecord>> {
        let loans = sqlx::query_as::<_, LoanRecord>(
            r#"
            SELECT l.book_id, b.title, l.loan_date, l.created_at, l.returned_at
            FROM loans l
            JOIN books b ON b.id = l.book_id
            WHERE l.user_id = $1
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Borrow a book for a user.
    ///
    /// Preconditions checked in order: the book exists (404), the user
    /// exists (404) and is below the loan cap (403), the book is free
    /// (409). The counter bump
    /// and the `free -> loan` transition are conditional updates, so two
    /// racing borrows of the same book cannot both commit.
    pub async fn borrow(&self, user_id: Uuid, book_id: Uuid, max_open: i32) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let book_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
        if !book_exists {
            return Err(AppError::NotFound(format!(
                "Book with id {} not found",
                book_id
            )));
        }

        let counted = sqlx::query(
            r#"
            UPDATE users
            SET loan_count = loan_count + 1, updated_at = NOW()
            WHERE id = $1 AND loan_count < $2
            "#,
        )
        .bind(user_id)
        .bind(max_open)
        .execute(&mut *tx)
        .await?;
        if counted.rows_affected() == 0 {
            // Zero rows means either the user row is gone or the cap is hit;
            // tell those apart before reporting.
            let user_exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                    .bind(user_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !user_exists {
                return Err(AppError::NotFound(format!(
                    "User with id {} not found",
                    user_id
                )));
            }
            return Err(AppError::Authorization(format!(
                "Maximum number of open loans reached ({}), return a book first",
                max_open
            )));
        }

        let moved = sqlx::query(
            "UPDATE books SET state = 'loan', updated_at = NOW() WHERE id = $1 AND state = 'free'",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;
        if moved.rows_affected() == 0 {
            // Dropping the transaction rolls the counter bump back.
            return Err(AppError::Conflict(
                "The requested book is already on loan".to_string(),
            ));
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, loan_date)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(Utc::now().date_naive())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| super::on_unique_violation(e, "The requested book is already on loan"))?;

        tx.commit().await?;
        Ok(loan)
    }

    /// Return a borrowed book.
    ///
    /// Requires an open loan for this exact (user, book) pair. Book state,
    /// loan row and counter are restored together or not at all.
    pub async fn give_back(&self, user_id: Uuid, book_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let book_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
        if !book_exists {
            return Err(AppError::NotFound(format!(
                "Book with id {} not found",
                book_id
            )));
        }

        let removed = sqlx::query("DELETE FROM loans WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book_id)
            .execute(&mut *tx)
            .await?;
        if removed.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "No open loan found for this book".to_string(),
            ));
        }

        sqlx::query(
            "UPDATE books SET state = 'free', updated_at = NOW() WHERE id = $1 AND state = 'loan'",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users
            SET loan_count = loan_count - 1, updated_at = NOW()
            WHERE id = $1 AND loan_count > 0
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
