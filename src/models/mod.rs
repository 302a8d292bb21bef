//! Data models for the Communal Library server

pub mod book;
pub mod loan;
pub mod user;

pub use book::{Book, BookState};
pub use loan::Loan;
pub use user::{Claims, Role, User};
