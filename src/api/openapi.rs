//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{dashboard, health, inventory, loans, policy};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "0.3.0",
        description = "Library lending REST API: borrowing, returns, renewals and loan dashboards"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Loans
        loans::borrow_books,
        loans::return_books,
        loans::renew_books,
        loans::get_member_loans,
        // Dashboard
        dashboard::get_dashboard,
        // Inventory
        inventory::list_copies,
        inventory::add_stock,
        inventory::remove_stock,
        inventory::delete_book,
        // Policy
        policy::get_policy,
        policy::update_policy,
    ),
    components(
        schemas(
            // Loans
            loans::LoanBatchRequest,
            loans::BorrowResponse,
            loans::ReturnResponse,
            loans::RenewResponse,
            crate::models::loan::LoanDetails,
            crate::services::loans::RestrictedCopy,
            crate::services::loans::RenewalRejection,
            // Dashboard
            crate::models::dashboard::SystemDashboard,
            crate::models::dashboard::MemberDashboard,
            crate::models::dashboard::LoanCounts,
            crate::models::dashboard::CategoryStats,
            // Inventory
            crate::models::copy::BookCopy,
            crate::models::copy::NewStock,
            crate::models::copy::StockSummary,
            inventory::DeleteBookResponse,
            // Policy
            crate::models::policy::Policy,
            crate::models::policy::UpdatePolicy,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "loans", description = "Borrowing, returns and renewals"),
        (name = "dashboard", description = "Loan dashboards"),
        (name = "inventory", description = "Copy stock management"),
        (name = "policy", description = "Lending policy")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
