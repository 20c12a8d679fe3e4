use crate::handlers::{
    budgets::{delete_budget, get_budget, get_budget_overview, get_budgets, upsert_budget},
    expenses::{create_expense, delete_expense, get_expense, get_expenses, update_expense},
    health::health_check,
    recurring_payments::{
        create_recurring_payment, delete_recurring_payment, get_recurring_payment,
        get_recurring_payments, process_recurring_payments, update_recurring_payment,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Expense CRUD routes
        .route("/api/v1/expenses", post(create_expense))
        .route("/api/v1/expenses", get(get_expenses))
        .route("/api/v1/expenses/:expense_id", get(get_expense))
        .route("/api/v1/expenses/:expense_id", put(update_expense))
        .route("/api/v1/expenses/:expense_id", delete(delete_expense))
        // Budget routes
        .route("/api/v1/budgets", put(upsert_budget))
        .route("/api/v1/budgets", get(get_budgets))
        .route("/api/v1/budgets/overview", get(get_budget_overview))
        .route("/api/v1/budgets/:budget_id", get(get_budget))
        .route("/api/v1/budgets/:budget_id", delete(delete_budget))
        // Recurring payment routes
        .route("/api/v1/recurring-payments", post(create_recurring_payment))
        .route("/api/v1/recurring-payments", get(get_recurring_payments))
        .route("/api/v1/recurring-payments/process", post(process_recurring_payments))
        .route("/api/v1/recurring-payments/:payment_id", get(get_recurring_payment))
        .route("/api/v1/recurring-payments/:payment_id", put(update_recurring_payment))
        .route("/api/v1/recurring-payments/:payment_id", delete(delete_recurring_payment))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
