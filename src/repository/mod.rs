//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool.
///
/// Constructed once at startup and threaded explicitly through the service
/// layer; there is no global store handle.
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Map unique-constraint violations to a conflict with the given message,
/// leaving other database errors untouched.
pub(crate) fn on_unique_violation(err: sqlx::Error, msg: &str) -> crate::error::AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.kind() == sqlx::error::ErrorKind::UniqueViolation {
            return crate::error::AppError::Conflict(msg.to_string());
        }
    }
    crate::error::AppError::Database(err)
}
