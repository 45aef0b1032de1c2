//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, loans, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pustaka API",
        version = "0.3.0",
        description = "Library Loan Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::register,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::delete_book,
        // Users
        users::get_profile,
        users::update_profile,
        // Loans
        loans::request_loan,
        loans::decide_loan,
        loans::return_loan,
        loans::list_outstanding_loans,
        loans::get_loan_history,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::MeResponse,
            // Books
            crate::models::title::TitleSummary,
            crate::models::title::TitleDetail,
            crate::models::title::CreateBook,
            crate::models::title::CreatedBook,
            crate::models::review::ReviewView,
            books::CreateBookResponse,
            // Users
            crate::models::user::UserRole,
            crate::models::user::UserProfile,
            crate::models::user::CreateUser,
            crate::models::user::UpdateProfile,
            // Loans
            crate::models::loan::LoanStatus,
            crate::models::loan::LoanDecision,
            crate::models::loan::CreateLoan,
            crate::models::loan::ReturnLoan,
            crate::models::loan::LoanOverview,
            crate::models::loan::LoanHistoryEntry,
            loans::LoanResponse,
            loans::DecideLoanRequest,
            loans::DecideLoanResponse,
            loans::ReturnResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Catalog and book management"),
        (name = "users", description = "Member profiles"),
        (name = "loans", description = "Loan lifecycle")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
