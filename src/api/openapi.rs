//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, loans, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Communal Library API",
        version = "0.1.0",
        description = "REST backend for the communal library: accounts, catalog and loans",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Users
        users::register,
        users::login,
        users::logout,
        users::me,
        users::update_me,
        users::delete_me,
        users::refresh,
        // Books
        books::list_available_books,
        books::list_books,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Loans
        loans::borrow_book,
        loans::return_book,
        loans::my_loans,
        loans::user_loans,
    ),
    components(
        schemas(
            // Users
            crate::models::user::User,
            crate::models::user::UserProfile,
            crate::models::user::Role,
            crate::models::user::RegisterUser,
            crate::models::user::LoginUser,
            crate::models::user::UpdateProfile,
            users::ProfileResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookState,
            crate::models::book::BookPayload,
            books::BooksResponse,
            books::AvailableBooksResponse,
            books::BookResponse,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanRecord,
            crate::models::loan::BorrowBook,
            loans::LoansResponse,
            loans::UserLoansResponse,
            // Health
            health::HealthResponse,
            // Envelope
            crate::api::MsgResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Account management and authentication"),
        (name = "books", description = "Book catalog management"),
        (name = "loans", description = "Loan lifecycle")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
